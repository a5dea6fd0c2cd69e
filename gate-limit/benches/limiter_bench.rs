use std::hint::black_box;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;

use governor::Quota;
use governor::RateLimiter;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;

use gate_limit::FixedWindow;
use gate_limit::Gcra;
use gate_limit::LeakyBucket;
use gate_limit::Limiter;
use gate_limit::LimiterFactory;
use gate_limit::Registry;
use gate_limit::SlidingWindow;
use gate_limit::TokenBucket;

// Bridge Governor into the gate-limit Limiter trait so it runs under the
// same harness.
#[derive(Debug)]
struct GovernorLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, governor::clock::QuantaClock>,
}

impl Limiter for GovernorLimiter {
    fn allow(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

fn bench_single_limiter(group_name: &str, c: &mut Criterion, limiter: Arc<dyn Limiter>) {
    let mut group = c.benchmark_group(group_name);

    group.bench_function("single-threaded", |b| {
        b.iter(|| black_box(limiter.as_ref()).allow())
    });

    group.finish();
}

fn bench_parallel_limiter(group_name: &str, c: &mut Criterion, limiter: Arc<dyn Limiter>) {
    let mut group = c.benchmark_group(group_name);

    for threads in [2, 4, 8].iter() {
        let num_threads = *threads;
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}-threads", num_threads)),
            &num_threads,
            |b, &n| {
                b.iter_custom(|iters| {
                    let barrier = Arc::new(Barrier::new(n + 1));
                    let mut handles = Vec::with_capacity(n);

                    for _ in 0..n {
                        let limiter = Arc::clone(&limiter);
                        let bar = Arc::clone(&barrier);
                        let iters_per_thread = iters / n as u64;

                        handles.push(thread::spawn(move || {
                            bar.wait(); // Wait for the start signal
                            for _ in 0..iters_per_thread {
                                let _ = black_box(limiter.allow());
                            }
                        }));
                    }

                    // Synchronize the start across all threads
                    barrier.wait();
                    let start = Instant::now();

                    for handle in handles {
                        let _ = handle.join();
                    }

                    start.elapsed()
                });
            },
        );
    }
    group.finish();
}

fn bench_registry(c: &mut Criterion, limit: u32) {
    let factory: LimiterFactory = Box::new(move |_| Box::new(TokenBucket::new(limit, limit)));
    let registry = Arc::new(Registry::new(factory).expect("infallible factory"));

    // Warm a working set of keys so the bench measures dispatch, not
    // first-sight insertion.
    let keys: Vec<String> = (0..128).map(|i| format!("user-{i}")).collect();
    for key in &keys {
        registry.allow(key);
    }

    let mut group = c.benchmark_group("Registry");
    group.bench_function("hot-key-dispatch", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(registry.allow(&keys[i]))
        })
    });
    group.finish();
}

fn run_all_benches(c: &mut Criterion) {
    let limit = 1_000_000u32;
    let window = Duration::from_secs(60);

    // --- 1. Initialize all strategies ---

    let tb = Arc::new(TokenBucket::new(limit, limit));
    let lb = Arc::new(LeakyBucket::new(limit, limit));
    let fw = Arc::new(FixedWindow::new(limit, window));
    let sw = Arc::new(SlidingWindow::new(limit, window));
    let gcra = Arc::new(Gcra::new(f64::from(limit), limit));

    let quota = Quota::per_minute(NonZeroU32::new(limit).expect("limit is non-zero"));
    let gov = Arc::new(GovernorLimiter {
        limiter: RateLimiter::direct_with_clock(quota, governor::clock::QuantaClock::default()),
    });

    // --- 2. Single-threaded and contended runs per strategy ---

    let limiters: Vec<(&str, Arc<dyn Limiter>)> = vec![
        ("TokenBucket", tb),
        ("LeakyBucket", lb),
        ("FixedWindow", fw),
        ("SlidingWindow", sw),
        ("Gcra", gcra),
        ("Governor", gov),
    ];

    for (name, limiter) in limiters {
        bench_single_limiter(name, c, Arc::clone(&limiter));
        bench_parallel_limiter(name, c, limiter);
    }

    // --- 3. Keyed dispatch through the registry ---

    bench_registry(c, limit);
}

criterion_group!(benches, run_all_benches);
criterion_main!(benches);
