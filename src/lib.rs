//! The library code for the `pagemill` page generator. A generation cycle
//! breaks down into four steps:
//!
//! 1. Allocating output folders ([`crate::folders`])
//! 2. Synthesizing one record per page from a keyword corpus
//!    ([`crate::record`], [`crate::text`])
//! 3. Selecting internal links for each page over the complete record list
//!    ([`crate::links`])
//! 4. Rendering each page's template and writing it to disk
//!    ([`crate::write`])
//!
//! [`crate::build::run_cycle`] stitches these together. The third step is the
//! only one that looks at more than one record at a time: pages link mostly
//! within their own folder (their "cluster") and a little across folders, and
//! no URL is linked twice from the same page.
//!
//! Templates and keywords are loaded by [`crate::store`] according to the
//! project configuration ([`crate::config`]). The keyword corpus can be grown
//! with [`crate::scrape`], which pulls article titles and descriptions from a
//! site's sitemap.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod folders;
pub mod links;
pub mod record;
pub mod scrape;
pub mod store;
pub mod text;
pub mod write;
