//! # Studio Scheduling Engine
//!
//! Recurring-session scheduling and temporal commitment engine for a studio
//! management system.
//!
//! This crate expands versioned weekly recurrence definitions into concrete
//! bookable session occurrences, tracks each student's attendance intent per
//! recurring series as an append-only timestamp-versioned ledger, and enforces
//! quota limits derived from the student's active subscription plan at the
//! moment a commitment is recorded. The engine exposes a REST API via Axum for
//! the surrounding application.
//!
//! ## Features
//!
//! - **Materialization**: expand a date range into session occurrences from
//!   the recurrence version effective on each day, merged with per-occurrence
//!   overrides
//! - **Commitment Ledger**: append-only attendance-intent records with
//!   point-in-time queries and "this and all following" splits
//! - **Quota Enforcement**: plan-assignment-scoped commitment limits checked
//!   before any ledger write
//! - **HTTP API**: RESTful endpoints for the surrounding application
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: identifiers, enums, and externally visible projections
//! - [`models`]: domain records (recurrence versions, commitments, plans)
//! - [`db`]: repository pattern and persistence layer
//! - [`directory`]: external collaborators (trainer/student/plan lookups)
//! - [`services`]: the scheduling and commitment engine itself
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod api;

pub mod db;
pub mod directory;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
