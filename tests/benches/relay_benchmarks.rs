//! # Star-Relay Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | sr-01-relay | Full relay lifecycle per routing case and payload size |
//! | sr-fabric | Collective round trips on the in-memory fabric |
//! | sr-compute | Local kernels and the distributed reductions |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_fabric::{run_nodes, InMemoryFabric, NodeTopology};
use shared_types::{TaskError, TaskRunner};
use sr_01_star_relay::{DeliveryPolicy, Request};
use sr_compute::{column_minima, sum_of_squares, weighted_sum, ColumnMinTask, Integral, Matrix};
use sr_tests::fixtures::{random_payload, relay_on_cluster};
use std::time::Duration;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

// ============================================================================
// SR-01: Relay
// ============================================================================

fn bench_relay_cases(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("sr-01-relay");
    group.measurement_time(Duration::from_secs(5));

    let cases = [
        ("broadcast", 0, 0),
        ("hub_to_spoke", 0, 2),
        ("spoke_to_hub", 1, 0),
        ("spoke_to_spoke", 1, 3),
        ("self_relay", 2, 2),
    ];
    for size in [16, 1024, 65_536] {
        let payload = random_payload(size);
        group.throughput(Throughput::Elements(size as u64));
        for (name, source, destination) in cases {
            group.bench_with_input(BenchmarkId::new(name, size), &payload, |b, payload| {
                b.iter(|| {
                    let request = Request::new(source, destination, payload.clone());
                    black_box(rt.block_on(relay_on_cluster(
                        4,
                        DeliveryPolicy::DestinationOnly,
                        request,
                    )))
                })
            });
        }
    }

    group.finish();
}

fn bench_relay_cluster_size(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("sr-01-relay-nodes");
    let payload = random_payload(1024);

    for nodes in [3, 8, 16] {
        for policy in [DeliveryPolicy::DestinationOnly, DeliveryPolicy::ReplicateToAll] {
            group.bench_with_input(
                BenchmarkId::new(format!("{policy:?}"), nodes),
                &nodes,
                |b, &nodes| {
                    b.iter(|| {
                        let request = Request::new(1, nodes - 1, payload.clone());
                        black_box(rt.block_on(relay_on_cluster(nodes, policy, request)))
                    })
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Fabric collectives
// ============================================================================

fn bench_barrier(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("sr-fabric");

    for nodes in [2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("barrier", nodes), &nodes, |b, &nodes| {
            b.iter(|| {
                rt.block_on(async {
                    let fabric = InMemoryFabric::new(nodes).expect("fabric");
                    run_nodes(fabric, |mut comm| async move { comm.barrier().await })
                        .await
                        .expect("cluster")
                })
            })
        });
    }

    group.finish();
}

// ============================================================================
// Compute
// ============================================================================

fn bench_compute(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("sr-compute");

    let integral = Integral::new((0.0, 1.0), (0.0, 1.0), (500, 500));
    group.bench_function("trapezoid_weighted_sum_500x500", |b| {
        b.iter(|| black_box(weighted_sum(&integral, sum_of_squares, 0..integral.columns())))
    });

    let columns: Vec<Vec<i32>> = (0..256).map(|_| random_payload(256)).collect();
    group.bench_function("column_minima_256x256", |b| {
        b.iter(|| black_box(column_minima(&columns)))
    });

    let matrix: Matrix = (0..128).map(|_| random_payload(128)).collect();
    for nodes in [1, 4] {
        group.bench_with_input(
            BenchmarkId::new("column_min_task_128x128", nodes),
            &nodes,
            |b, &nodes| {
                b.iter(|| {
                    rt.block_on(async {
                        let fabric = InMemoryFabric::new(nodes).expect("fabric");
                        run_nodes(fabric, |comm| {
                            let local = if comm.is_hub() {
                                matrix.clone()
                            } else {
                                Matrix::new()
                            };
                            async move {
                                let mut runner = TaskRunner::new(ColumnMinTask::new(comm, local));
                                runner.execute().await?;
                                Ok::<_, TaskError>(runner.into_output())
                            }
                        })
                        .await
                        .expect("cluster")
                    })
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_relay_cases,
    bench_relay_cluster_size,
    bench_barrier,
    bench_compute,
);

criterion_main!(benches);
