//! Subcommand implementations.

pub mod add;
pub mod edit;
pub mod list;
pub mod remove;
pub mod status;
pub mod toggle;
pub mod watch;

use taskdeck_core::Task;

/// One-line rendering of a task for text output.
pub fn describe(task: &Task) -> String {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    let mut line = format!("{} {:>4}  {}", mark, task.id.as_str(), task.title);

    if let Some(priority) = task.priority_label() {
        line.push_str(&format!("  (p{})", priority));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", due.format("%Y-%m-%d")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let task = Task::new("3", "Buy milk").with_priority(2);
        assert_eq!(describe(&task), "[ ]    3  Buy milk  (p2)");

        let done = Task::new("12", "Write report").with_completed(true);
        assert_eq!(describe(&done), "[x]   12  Write report");
    }
}
