#![allow(dead_code)]

use async_trait::async_trait;
use course_roster::{
    AppConfig, AppState,
    auth::AuthUser,
    error::AppError,
    models::{Course, CourseFilter, Role, UpdateCourseRequest, User},
    repository::Repository,
    storage::MockStorageService,
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use uuid::Uuid;

// --- IN-MEMORY REPOSITORY ---

/// Stands in for Postgres. `fail` makes every call return a dependency error;
/// `roster_writes` counts atomic roster replaces.
#[derive(Default)]
pub struct InMemoryRepository {
    users: Mutex<HashMap<Uuid, User>>,
    courses: Mutex<HashMap<Uuid, Course>>,
    pub fail: AtomicBool,
    pub roster_writes: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: Uuid, name: &str, role: Role) -> User {
        let user = User {
            id,
            email: format!("{}@uni.test", name.to_lowercase().replace(' ', ".")),
            name: name.to_string(),
            role,
        };
        self.users.lock().unwrap().insert(id, user.clone());
        user
    }

    pub fn add_course(&self, id: Uuid, instructor_id: Uuid, students: &[Uuid]) -> Course {
        let mut students = students.to_vec();
        students.sort();
        let course = Course {
            id,
            subject: "CS".to_string(),
            number: "101".to_string(),
            term: "2025-fall".to_string(),
            instructor_id,
            students,
            ..Course::default()
        };
        self.courses.lock().unwrap().insert(id, course.clone());
        course
    }

    pub fn insert_course(&self, course: Course) {
        self.courses.lock().unwrap().insert(course.id, course);
    }

    pub fn roster(&self, course_id: Uuid) -> Vec<Uuid> {
        self.courses
            .lock()
            .unwrap()
            .get(&course_id)
            .map(|c| c.students.clone())
            .unwrap_or_default()
    }

    pub fn writes(&self) -> usize {
        self.roster_writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(AppError::Dependency("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.check()?;
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn get_course(&self, id: Uuid) -> Result<Option<Course>, AppError> {
        self.check()?;
        Ok(self.courses.lock().unwrap().get(&id).cloned())
    }

    async fn query_courses(
        &self,
        filter: &CourseFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Course>, AppError> {
        self.check()?;
        let mut matching: Vec<Course> = self
            .courses
            .lock()
            .unwrap()
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            (&a.subject, &a.number, &a.term, a.id).cmp(&(&b.subject, &b.number, &b.term, b.id))
        });
        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn create_course(&self, course: Course) -> Result<Course, AppError> {
        self.check()?;
        self.courses.lock().unwrap().insert(course.id, course.clone());
        Ok(course)
    }

    async fn update_course(
        &self,
        id: Uuid,
        req: UpdateCourseRequest,
    ) -> Result<Option<Course>, AppError> {
        self.check()?;
        let mut courses = self.courses.lock().unwrap();
        let Some(course) = courses.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(subject) = req.subject {
            course.subject = subject;
        }
        if let Some(number) = req.number {
            course.number = number;
        }
        if let Some(term) = req.term {
            course.term = term;
        }
        if let Some(instructor_id) = req.instructor_id {
            course.instructor_id = instructor_id;
        }
        if let Some(assignments) = req.assignments {
            course.assignments = assignments;
        }
        Ok(Some(course.clone()))
    }

    async fn delete_course(&self, id: Uuid) -> Result<bool, AppError> {
        self.check()?;
        Ok(self.courses.lock().unwrap().remove(&id).is_some())
    }

    async fn replace_roster(
        &self,
        course_id: Uuid,
        students: &[Uuid],
    ) -> Result<Option<Course>, AppError> {
        self.check()?;
        let mut courses = self.courses.lock().unwrap();
        let Some(course) = courses.get_mut(&course_id) else {
            return Ok(None);
        };
        course.students = students.to_vec();
        self.roster_writes.fetch_add(1, Ordering::SeqCst);
        Ok(Some(course.clone()))
    }
}

// --- FIXTURES ---

pub const ADMIN_ID: Uuid = Uuid::from_u128(0xA0);
pub const INSTRUCTOR_ID: Uuid = Uuid::from_u128(0x10);
pub const OTHER_INSTRUCTOR_ID: Uuid = Uuid::from_u128(0x11);
pub const COURSE_ID: Uuid = Uuid::from_u128(0xC0);

// Student ids, ordered A < B < D < Z.
pub const STUDENT_A: Uuid = Uuid::from_u128(0x1A);
pub const STUDENT_B: Uuid = Uuid::from_u128(0x1B);
pub const STUDENT_D: Uuid = Uuid::from_u128(0x1D);
pub const STUDENT_Z: Uuid = Uuid::from_u128(0x1F);

/// Course C with roster {A, B}, owned by INSTRUCTOR_ID. D exists as a student but is not
/// enrolled; Z does not exist at all.
pub fn seeded_repo() -> Arc<InMemoryRepository> {
    let repo = Arc::new(InMemoryRepository::new());
    repo.add_user(ADMIN_ID, "Ada Admin", Role::Admin);
    repo.add_user(INSTRUCTOR_ID, "Ivan Instructor", Role::Instructor);
    repo.add_user(OTHER_INSTRUCTOR_ID, "Olga Other", Role::Instructor);
    repo.add_user(STUDENT_A, "Alice", Role::Student);
    repo.add_user(STUDENT_B, "Bob", Role::Student);
    repo.add_user(STUDENT_D, "Dana", Role::Student);
    repo.add_course(COURSE_ID, INSTRUCTOR_ID, &[STUDENT_A, STUDENT_B]);
    repo
}

pub fn test_state(repo: Arc<InMemoryRepository>, storage: MockStorageService) -> AppState {
    AppState {
        repo,
        storage: Arc::new(storage),
        config: AppConfig::default(),
    }
}

pub fn principal(id: Uuid, role: Role) -> AuthUser {
    AuthUser { id, role }
}

pub fn admin() -> AuthUser {
    principal(ADMIN_ID, Role::Admin)
}

pub fn instructor() -> AuthUser {
    principal(INSTRUCTOR_ID, Role::Instructor)
}

pub fn other_instructor() -> AuthUser {
    principal(OTHER_INSTRUCTOR_ID, Role::Instructor)
}

pub fn student(id: Uuid) -> AuthUser {
    principal(id, Role::Student)
}

/// Empty side of a batch.
pub const NONE: [Uuid; 0] = [];
