use uuid::Uuid;

use kiln_types::models::GeneratedCode;

/// All files of a thread as one text document, each prefixed by its path.
pub fn export_bundle(files: &[GeneratedCode]) -> String {
    files
        .iter()
        .map(|f| format!("// {}\n{}\n\n", f.file_path, f.content))
        .collect()
}

pub fn bundle_file_name(thread_id: Uuid) -> String {
    format!("generated-code-{thread_id}.txt")
}
