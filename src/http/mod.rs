//! HTTP API server for the interview front end
//!
//! This module provides a REST API for controlling interview sessions:
//! - POST /interviews/start - Start a new interview
//! - POST /interviews/:id/pause - Soft-pause recognition
//! - POST /interviews/:id/resume - Resume recognition
//! - POST /interviews/:id/stop - Stop an interview
//! - GET /interviews/:id/status - Query session state and stats
//! - GET /interviews/:id/transcript - Get the bilingual transcript
//! - GET /interviews/:id/preview - Get the live translation preview
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, SpeechServices};
