pub mod demo_reviews_seed;
