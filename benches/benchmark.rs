#[macro_use]
extern crate criterion;

use criterion::Criterion;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cfrec::data::{Item, RatingRecord, RatingStore};
use cfrec::recommendation::recommend;
use cfrec::similarity::rank_similar_users;
use cfrec::UserIdPolicy;

fn synthetic_store(num_users: usize, num_items: usize, ratings_per_user: usize) -> RatingStore {
    let mut rng = StdRng::seed_from_u64(42);

    let items = (1..=num_items)
        .map(|id| Item::new(id, format!("Item {}", id)))
        .collect();
    let ratings = (1..=num_users)
        .flat_map(|user_id| {
            (0..ratings_per_user)
                .map(|_| {
                    let item_id = rng.gen_range(1..=num_items);
                    let half_stars: u8 = rng.gen_range(1..=10);
                    RatingRecord::new(user_id, item_id, f64::from(half_stars) / 2.0)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    RatingStore::from_records(items, ratings, UserIdPolicy::Contiguous).unwrap()
}

fn bench_rank_similar_users(c: &mut Criterion) {
    let store = synthetic_store(1000, 2000, 50);

    c.bench_function("rank_similar_users", |b| {
        b.iter(|| rank_similar_users(&store, 1).unwrap())
    });
}

fn bench_recommend(c: &mut Criterion) {
    let store = synthetic_store(1000, 2000, 50);
    let neighbours = rank_similar_users(&store, 1).unwrap();

    c.bench_function("recommend", |b| {
        b.iter(|| recommend(&store, 1, &neighbours, 2).unwrap())
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_rank_similar_users, bench_recommend
}
criterion_main!(benches);
