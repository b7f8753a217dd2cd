/// Kiln Preview
///
/// Turns one generated source file into a self-contained HTML document that
/// renders it with React from public CDNs, plus the sandboxed frame that
/// hosts it and the plain-text bundle used for "download all".
///
/// Nothing here validates the generated source. Isolation comes entirely from
/// the sandbox: scripts may run, but the document gets an opaque origin.
pub mod bundle;
pub mod document;
pub mod frame;

pub use bundle::{bundle_file_name, export_bundle};
pub use document::{component_name, prepare_source, render_document};
pub use frame::{CSP_SANDBOX, SANDBOX_FLAGS, sandbox_frame};
