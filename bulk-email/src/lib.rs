//! Bulk email authorization queries for Coursework Engine
//!
//! This crate answers three read-only questions for the instructor email tool:
//! - Has a learner opted out of bulk email for a course?
//! - Is the bulk email feature available, optionally for a given course?
//! - Is a specific course authorized to send bulk email?
//!
//! # Core Concepts
//!
//! - **Opt-out**: a (user, course) record meaning the user receives no bulk email for that course
//! - **Bulk email flag**: the global on/off switch, with an optional mode that
//!   requires per-course authorization
//! - **Course authorization**: a per-course record enabling bulk email while
//!   that mode is active
//!
//! Missing records are never errors: they read as `false`. Failures of the
//! backing store are returned to the caller unchanged.
//!
//! # Example
//!
//! ```rust
//! use bulk_email::{
//!     BulkEmailFlag, BulkEmailQueryService, CourseAuthorization, CourseId,
//!     repository::InMemoryBulkEmailRepository,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = Arc::new(InMemoryBulkEmailRepository::new());
//!     let course = CourseId::parse("course-v1:Org+CS101+2026")?;
//!
//!     repo.push_flag(BulkEmailFlag::new(true, true));
//!     repo.set_course_authorization(CourseAuthorization::new(course.clone(), true));
//!
//!     let service = BulkEmailQueryService::new(repo);
//!     assert!(service.is_bulk_email_enabled(Some(&course)).await?);
//!     assert!(!service.is_bulk_email_enabled(None).await?);
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing))]

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod service;

pub use config::*;
pub use error::*;
pub use models::*;
pub use service::*;
