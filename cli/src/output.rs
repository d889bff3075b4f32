use escli_core::dump::DumpReport;
use escli_core::migrate::CopyReport;
use escli_core::remote::RemoteCopyReport;
use escli_core::restore::RestoreReport;
use escli_core::swap::SwapReport;
use escli_core::{Count, Detail, Indices, RunningTask, Task, Version};
use std::fmt;

/// What a command produced. Printed to stdout unless empty.
#[derive(Debug)]
pub enum Output {
    Indices(Indices),
    Count(Count),
    Task(Task),
    Tasks(Vec<RunningTask>),
    Detail(Detail),
    Version(Version),
    Pong(String),
    Copied(CopyReport),
    Swapped(SwapReport),
    Dumped(DumpReport),
    Restored(RestoreReport),
    RemoteCopied(RemoteCopyReport),
    Empty,
}

impl Output {
    pub fn is_empty(&self) -> bool { matches!(self, Output::Empty) || matches!(self, Output::Tasks(t) if t.is_empty()) }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Indices(indices) => write!(f, "{indices}"),
            Output::Count(count) => write!(f, "{count}"),
            Output::Task(task) => write!(f, "{task}"),
            Output::Tasks(tasks) => {
                for (i, task) in tasks.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{task}")?;
                }
                Ok(())
            }
            Output::Detail(detail) => write!(f, "{detail}"),
            Output::Version(version) => write!(f, "{version}"),
            Output::Pong(host) => write!(f, "{host} is reachable"),
            Output::Copied(r) => write!(f, "copied {} documents (task {}, {} polls)", r.documents, r.task_id, r.polls),
            Output::Swapped(r) => write!(
                f,
                "alias {} now points at {} ({} documents); {} deleted",
                r.alias, r.new_index, r.copy.documents, r.old_index
            ),
            Output::Dumped(r) => write!(f, "dumped {} documents in {} searches", r.documents, r.searches),
            Output::Restored(r) => write!(f, "restored {} documents in {} batches", r.documents, r.batches),
            Output::RemoteCopied(r) => write!(f, "copied {} documents into {} ({} pages)", r.documents, r.index, r.pages),
            Output::Empty => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_print_one_per_line() {
        let out = Output::Indices(Indices::from_names(["a", "b"]));
        assert_eq!(out.to_string(), "a\nb");
    }

    #[test]
    fn running_tasks_print_one_per_line() {
        let out = Output::Tasks(vec![
            RunningTask { id: "n1:4".into(), action: "indices:data/write/reindex".into() },
            RunningTask { id: "n1:9".into(), action: "indices:data/write/bulk".into() },
        ]);
        assert_eq!(out.to_string(), "n1:4 indices:data/write/reindex\nn1:9 indices:data/write/bulk");
        assert_eq!(Output::Tasks(Vec::new()).to_string(), "");
    }

    #[test]
    fn empty_prints_nothing() {
        assert!(Output::Empty.is_empty());
        assert_eq!(Output::Empty.to_string(), "");
        assert!(!Output::Count(Count { num: 3 }).is_empty());
    }
}
