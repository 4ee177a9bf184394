// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera access
//!
//! Hardware access sits behind the [`camera::VideoSource`] trait so the
//! capture session never depends on a concrete device API.
//!
//! # Modules
//!
//! - [`camera`]: Video source trait, device handles, bundled sources

pub mod camera;
