use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use liftrs::{ExerciseLibrary, ExerciseRecordSnapshot, FatigueEngine, MuscleGroup, RecoveryModifiers};

/// Performance benchmarks for the fatigue engine
///
/// History sizes range from a week of sessions to several months, well
/// beyond what a single recommendation normally sees.

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap()
}

fn create_history(sessions: usize) -> Vec<ExerciseRecordSnapshot> {
    let muscles = MuscleGroup::all();
    (0..sessions)
        .map(|i| {
            let mut record = ExerciseRecordSnapshot::new(reference() - Duration::hours(i as i64 * 9));
            record.exercise_id = Some(format!("exercise_{}", i % 17));
            record.primary_muscles.insert(muscles[i % muscles.len()]);
            record.secondary_muscles.insert(muscles[(i + 5) % muscles.len()]);
            record.completed_set_count = 3 + (i % 4) as i32;
            record.total_weight = Some(1500.0 + (i % 7) as f64 * 250.0);
            record.total_reps = Some(30.0);
            record
        })
        .collect()
}

fn bench_compute_states(c: &mut Criterion) {
    let engine = FatigueEngine::default();
    let mut group = c.benchmark_group("Muscle States");

    for &size in &[10, 50, 200, 1000] {
        let history = create_history(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("compute_states", size), &history, |b, history| {
            b.iter(|| {
                engine.compute_states_at(black_box(history), RecoveryModifiers::neutral(), reference())
            });
        });
    }

    group.finish();
}

fn bench_recommend(c: &mut Criterion) {
    let engine = FatigueEngine::default();
    let catalog = ExerciseLibrary::builtin();
    let mut group = c.benchmark_group("Recommendation");

    for &size in &[10, 50, 200, 1000] {
        let history = create_history(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("recommend", size), &history, |b, history| {
            b.iter(|| {
                engine.recommend_at(
                    black_box(history),
                    &catalog,
                    RecoveryModifiers::new(0.9, 1.05),
                    reference(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compute_states, bench_recommend);
criterion_main!(benches);
