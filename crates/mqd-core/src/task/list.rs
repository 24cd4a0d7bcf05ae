use super::types::{Task, TaskIndex, TaskStatus};

/// Result of [`TaskList::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enqueued {
    pub index: TaskIndex,
    /// False when the URL was already in the list.
    pub is_new: bool,
}

/// Ordered list of tasks. Indexes are stable: tasks are only ever appended.
#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a queued task for `url`, or return the index of the existing one.
    ///
    /// A task that was marked removed is put back into the queue.
    pub fn enqueue(&mut self, url: &str) -> Enqueued {
        if let Some(index) = self.position(url) {
            let task = &mut self.tasks[index];
            if task.status == TaskStatus::Removed {
                task.status = TaskStatus::Queued;
            }
            return Enqueued {
                index,
                is_new: false,
            };
        }
        self.tasks.push(Task::new(url));
        Enqueued {
            index: self.tasks.len() - 1,
            is_new: true,
        }
    }

    pub fn position(&self, url: &str) -> Option<TaskIndex> {
        self.tasks.iter().position(|t| t.url == url)
    }

    pub fn get(&self, index: TaskIndex) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn get_mut(&mut self, index: TaskIndex) -> Option<&mut Task> {
        self.tasks.get_mut(index)
    }

    /// Mark a task removed. Returns false if the index is unknown.
    pub fn mark_removed(&mut self, index: TaskIndex) -> bool {
        match self.tasks.get_mut(index) {
            Some(task) => {
                task.status = TaskStatus::Removed;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskIndex, &Task)> {
        self.tasks.iter().enumerate()
    }
}
