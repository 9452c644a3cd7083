use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scopewire::{constructor, provides, Container};
use std::sync::Arc;

trait Logger: Send + Sync {
    fn level(&self) -> u8;
}

struct NullLogger;

impl NullLogger {
    fn new() -> Self {
        NullLogger
    }
}

impl Logger for NullLogger {
    fn level(&self) -> u8 {
        0
    }
}

struct Repository {
    logger: Arc<dyn Logger>,
}

impl Repository {
    fn new(logger: Arc<dyn Logger>) -> Self {
        Repository { logger }
    }
}

struct Service {
    repository: Arc<Repository>,
    logger: Arc<dyn Logger>,
}

impl Service {
    fn new(repository: Arc<Repository>, logger: Arc<dyn Logger>) -> Self {
        Service { repository, logger }
    }
}

constructor!(NullLogger => NullLogger::new());
constructor!(Repository => Repository::new(dyn Logger));
constructor!(Service => Service::new(Repository, dyn Logger));
provides!(NullLogger => dyn Logger);

// ===== Micro Benchmarks =====

fn bench_singleton_hit(c: &mut Criterion) {
    let mut container = Container::new();
    container.bind::<dyn Logger>().unwrap().to_singleton::<NullLogger>().unwrap();

    // Prime the singleton
    let _ = container.resolve::<dyn Logger>().unwrap();

    c.bench_function("singleton_hit_trait", |b| {
        b.iter(|| {
            let v = container.resolve::<dyn Logger>().unwrap();
            black_box(v.level());
        })
    });
}

fn bench_instance_hit(c: &mut Criterion) {
    let mut container = Container::new();
    container.bind::<u64>().unwrap().to_instance(42u64).unwrap();

    c.bench_function("instance_hit_u64", |b| {
        b.iter(|| black_box(container.resolve::<u64>().unwrap()))
    });
}

fn bench_scoped_vs_transient(c: &mut Criterion) {
    let mut group = c.benchmark_group("lifetime");

    for (name, scoped) in [("transient", false), ("scoped", true)] {
        let mut container = Container::new();
        container.bind::<dyn Logger>().unwrap().to_singleton::<NullLogger>().unwrap();
        let binder = container.bind::<Repository>().unwrap();
        if scoped {
            binder.to_scoped::<Repository>().unwrap();
        } else {
            binder.to_transient::<Repository>().unwrap();
        }
        container.bind::<Service>().unwrap().to_transient::<Service>().unwrap();

        group.bench_with_input(BenchmarkId::new("service_graph", name), &container, |b, container| {
            container.begin_scope();
            b.iter(|| {
                let service = container.resolve::<Service>().unwrap();
                black_box(service.repository.logger.level() + service.logger.level());
            });
            container.end_scope().unwrap();
        });
    }

    group.finish();
}

fn bench_scope_churn(c: &mut Criterion) {
    let mut container = Container::new();
    container.bind::<dyn Logger>().unwrap().to_singleton::<NullLogger>().unwrap();
    container.bind::<Repository>().unwrap().to_scoped::<Repository>().unwrap();

    c.bench_function("scope_begin_resolve_end", |b| {
        b.iter(|| {
            let _scope = container.scope();
            black_box(container.resolve::<Repository>().unwrap());
        })
    });
}

fn bench_registration(c: &mut Criterion) {
    c.bench_function("register_three_with_cycle_check", |b| {
        b.iter(|| {
            let mut container = Container::new();
            container.bind::<dyn Logger>().unwrap().to_singleton::<NullLogger>().unwrap();
            container.bind::<Repository>().unwrap().to_transient::<Repository>().unwrap();
            container.bind::<Service>().unwrap().to_transient::<Service>().unwrap();
            black_box(container)
        })
    });
}

criterion_group!(
    benches,
    bench_singleton_hit,
    bench_instance_hit,
    bench_scoped_vs_transient,
    bench_scope_churn,
    bench_registration
);
criterion_main!(benches);
