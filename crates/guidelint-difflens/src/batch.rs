//! Greedy grouping of changed files under a changed-line budget.

use guidelint_core::{Batch, ChangedFile};

/// Split `files` into batches whose total changes stay within `budget`.
///
/// A file whose own change count exceeds the budget always gets a batch to
/// itself. Files are never split and batch order follows input order.
///
/// # Examples
///
/// ```
/// use guidelint_core::ChangedFile;
/// use guidelint_difflens::batch::create_batches;
///
/// let files = vec![
///     ChangedFile::new("a.ts", "", 5, 0),
///     ChangedFile::new("b.tsx", "", 150, 50),
/// ];
/// let batches = create_batches(files, 100);
/// assert_eq!(batches.len(), 2);
/// assert_eq!(batches[0].total_changes, 5);
/// assert_eq!(batches[1].files[0].new_path, "b.tsx");
/// ```
pub fn create_batches(files: Vec<ChangedFile>, budget: usize) -> Vec<Batch> {
    let mut batches = Vec::new();
    let mut current = Batch::default();

    for file in files {
        let changes = file.change_count();

        if changes > budget {
            if !current.files.is_empty() {
                batches.push(std::mem::take(&mut current));
            }
            batches.push(Batch {
                files: vec![file],
                total_changes: changes,
            });
            continue;
        }

        if current.total_changes + changes > budget && !current.files.is_empty() {
            batches.push(std::mem::take(&mut current));
        }

        current.files.push(file);
        current.total_changes += changes;
    }

    if !current.files.is_empty() {
        batches.push(current);
    }

    batches
}
