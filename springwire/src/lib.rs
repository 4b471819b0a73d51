//! Application layer for [springwire_di] dependency resolution.
//!
//! Definitions are rarely written by hand in code. Instead, every module of an application ships
//! a definitions file, and the final set of definitions is an overlay of all of them: files from
//! more specific modules (and from the active environment) override definitions with the same
//! interface and identifier from less specific ones. This crate provides:
//!
//! * discovery of definition files across module paths with
//!   [ModuleFileLocator](locator::ModuleFileLocator),
//! * reading and merging them into a [Container](springwire_di::container::Container) with
//!   [FileDefinitionReader](reader::FileDefinitionReader),
//! * caching merged definitions with [CachedDefinitionReader](cache::CachedDefinitionReader),
//! * an entrypoint in the form of [Application](application::Application), which reads
//!   configuration, sets up logging and creates the
//!   [Injector](springwire_di::injector::Injector).

pub mod application;
pub mod cache;
pub mod config;
pub mod locator;
pub mod reader;
