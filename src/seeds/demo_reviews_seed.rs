use chrono::{Duration, Utc};

use crate::models::{NewReview, NewUser};
use crate::store::{ReviewStore, StoreError, UserStore};

/// Seeds a handful of demo authors and reviews.
/// Only runs when the users collection is empty.
pub async fn seed_demo_reviews(
    users: &dyn UserStore,
    reviews: &dyn ReviewStore,
) -> Result<usize, StoreError> {
    let count = users.count().await?;
    if count > 0 {
        log::info!("🌱 Demo data: {} users already in store, skipping seed", count);
        return Ok(0);
    }

    log::info!("🌱 Demo data: seeding authors and reviews...");

    let now = Utc::now();
    let mut inserted = 0;

    for (firstname, lastname, entries) in demo_authors() {
        let user = users
            .insert_user(NewUser {
                firstname: firstname.to_string(),
                lastname: lastname.to_string(),
                profile_picture: format!(
                    "https://i.pravatar.cc/150?u={}.{}",
                    firstname.to_lowercase(),
                    lastname.to_lowercase()
                ),
            })
            .await?;

        for (days_ago, rating, text) in entries {
            reviews
                .insert_review(NewReview {
                    review_text: text.map(str::to_string),
                    rating,
                    published_date: Some(now - Duration::days(days_ago)),
                    user_id: user.id,
                })
                .await?;
            inserted += 1;
        }
    }

    log::info!("   ✅ Inserted {} demo reviews", inserted);
    Ok(inserted)
}

type DemoReview = (i64, Option<i32>, Option<&'static str>);

fn demo_authors() -> Vec<(&'static str, &'static str, Vec<DemoReview>)> {
    vec![
        (
            "Amara",
            "Perera",
            vec![
                (1, Some(5), Some("Clear lectures and well paced assignments.")),
                (12, Some(4), Some("Good course, the quizzes could be harder.")),
            ],
        ),
        (
            "Nuwan",
            "Silva",
            vec![
                (3, Some(2), Some("Videos kept buffering and the notes were outdated.")),
                (20, Some(3), None),
            ],
        ),
        (
            "Ishara",
            "Fernando",
            vec![
                (5, Some(1), Some("Could not access the final module at all.")),
                (6, Some(5), Some("Support fixed my enrolment within a day.")),
            ],
        ),
        (
            "Kavindu",
            "Jayasinghe",
            vec![(9, Some(3), Some("Average. Content is fine, forum is quiet."))],
        ),
        ("Dilini", "Wickramasinghe", vec![(30, None, Some("Still going through it."))]),
    ]
}
