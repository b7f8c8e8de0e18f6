//! Postgres-backed repository tests. Run with a database:
//! `DATABASE_URL=... cargo test -- --ignored`

use course_roster::{
    models::{Course, CourseFilter, Role, UpdateCourseRequest, User},
    repository::{PostgresRepository, Repository},
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

async fn create_test_user(pool: &PgPool, role: Role) -> User {
    let id = Uuid::new_v4();
    sqlx::query_as::<_, User>(
        "INSERT INTO profiles (id, email, name, role) VALUES ($1, $2, $3, $4) RETURNING id, email, name, role",
    )
    .bind(id)
    .bind(format!("{}@test.com", id))
    .bind(format!("Test {}", role))
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("Failed to create test user")
}

fn new_course(instructor_id: Uuid, subject: &str) -> Course {
    Course {
        id: Uuid::new_v4(),
        subject: subject.to_string(),
        number: "101".to_string(),
        term: "2025-fall".to_string(),
        instructor_id,
        ..Course::default()
    }
}

// --- Tests ---

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_and_get_course() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let instructor = create_test_user(&ctx.pool, Role::Instructor).await;

    let created = repo.create_course(new_course(instructor.id, "REPO")).await.unwrap();
    let fetched = repo.get_course(created.id).await.unwrap().unwrap();

    assert_eq!(fetched.instructor_id, instructor.id);
    assert!(fetched.students.is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_get_user_decodes_role() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let student = create_test_user(&ctx.pool, Role::Student).await;

    let fetched = repo.get_user(student.id).await.unwrap().unwrap();
    let missing = repo.get_users(&[student.id, Uuid::new_v4()]).await.unwrap();

    assert_eq!(fetched.role, Role::Student);
    assert_eq!(missing.len(), 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_replace_roster_is_whole_set() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let instructor = create_test_user(&ctx.pool, Role::Instructor).await;
    let course = repo.create_course(new_course(instructor.id, "ROST")).await.unwrap();

    let a = create_test_user(&ctx.pool, Role::Student).await.id;
    let b = create_test_user(&ctx.pool, Role::Student).await.id;
    repo.replace_roster(course.id, &[a, b]).await.unwrap();
    let updated = repo.replace_roster(course.id, &[b]).await.unwrap().unwrap();

    assert_eq!(updated.students, vec![b]);
    assert!(repo.replace_roster(Uuid::new_v4(), &[a]).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_query_courses_filters_and_pages() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let instructor = create_test_user(&ctx.pool, Role::Instructor).await;
    let subject = format!("Q{}", &Uuid::new_v4().simple().to_string()[..6]);
    for _ in 0..3 {
        repo.create_course(new_course(instructor.id, &subject)).await.unwrap();
    }

    let filter = CourseFilter {
        subject: Some(subject),
        ..CourseFilter::default()
    };
    let first = repo.query_courses(&filter, 2, 0).await.unwrap();
    let second = repo.query_courses(&filter, 2, 2).await.unwrap();
    let beyond = repo.query_courses(&filter, 2, 4).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 1);
    assert!(beyond.is_empty());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_and_delete_course() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let instructor = create_test_user(&ctx.pool, Role::Instructor).await;
    let course = repo.create_course(new_course(instructor.id, "UPD")).await.unwrap();

    let req = UpdateCourseRequest {
        number: Some("202".to_string()),
        ..UpdateCourseRequest::default()
    };
    let updated = repo.update_course(course.id, req).await.unwrap().unwrap();
    assert_eq!(updated.number, "202");
    assert_eq!(updated.subject, "UPD");

    assert!(repo.delete_course(course.id).await.unwrap());
    assert!(!repo.delete_course(course.id).await.unwrap());
}
