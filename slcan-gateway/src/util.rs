use tokio::task::JoinHandle;

/// Aborts the wrapped task as soon as the handle goes away.
#[derive(Debug)]
pub struct KillJoinHandle<T> {
    handle: Option<JoinHandle<T>>,
}

impl<T> KillJoinHandle<T> {
    /// Aborts the task and waits until it has been dropped.
    pub async fn kill(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // a cancelled JoinError is the expected outcome
            let _ = handle.await;
        }
    }
}

impl<T> Drop for KillJoinHandle<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub fn kill_task_on_drop<T>(handle: JoinHandle<T>) -> KillJoinHandle<T> {
    KillJoinHandle {
        handle: Some(handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn aborts_task_on_drop() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = kill_task_on_drop(tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await
        }));

        drop(handle);
        // the sender goes away together with the aborted task
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn kill_waits_for_the_task_to_go() {
        let (tx, mut rx) = tokio::sync::oneshot::channel::<()>();
        let handle = kill_task_on_drop(tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await
        }));

        handle.kill().await;
        // already gone, no further scheduling needed
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::oneshot::error::TryRecvError::Closed)
        ));
    }
}
