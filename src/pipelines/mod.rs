// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! Heavy work (rasterizing and compressing a frame) runs off the session
//! task, so the session keeps reacting to cancel requests while a photo is
//! being produced.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │   Artifact   │
//! │   (RGBA)     │     │  - Rasterize      │     │ (image/jpeg) │
//! │              │     │  - JPEG encoding  │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Frame capture and JPEG encoding

pub mod photo;
