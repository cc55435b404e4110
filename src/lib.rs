#![allow(async_fn_in_trait)]
pub mod catalog;
pub mod cleanup;
pub mod convert;
pub mod download_plan;
pub mod error;
pub mod feed;
pub mod geo;
pub mod geocode;
pub mod metadata;
pub mod mtl;
pub mod pipeline;
pub mod provider;
pub mod s3;
pub mod scene;
pub mod settings;
