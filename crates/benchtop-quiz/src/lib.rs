//! Offline validation harness for the microscope recommendation quiz.
//!
//! [`engine`] scores a product against one set of quiz answers;
//! [`validator`] runs the engine over scripted test cases and can grid-search
//! the weights; [`report`] renders the results as plain text.

pub mod cases;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod report;
pub mod validator;

pub use engine::{QuizEngine, Weights};
pub use error::{Error, Result};
pub use validator::{QuizValidator, ValidationResults};
