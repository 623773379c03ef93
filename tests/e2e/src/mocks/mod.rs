//! Mocks - fixtures and scripted collaborators


pub use contexts::{RecordedGrade, RecordingQueue, ScriptedContext};
pub use fixtures::{TestDataFactory, TestScenario, fixed_time};
