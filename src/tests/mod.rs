//! Unit and integration tests for the SDK
//!
//! This module contains tests for various components of the SDK.

pub mod easypost_mock_tests;
pub mod error_tests;
pub mod veeqo_mock_tests;
