//! Node and router abstractions

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::error::WorkflowError;

/// One unit of work: consumes the current state, produces the next one.
#[async_trait]
pub trait Node<S: Send + 'static>: Send + Sync {
    async fn run(&self, state: S) -> Result<S, WorkflowError>;
}

/// Reads the just-produced state and returns a branch label.
pub type Router<S> = Box<dyn Fn(&S) -> String + Send + Sync>;

/// Adapter turning an async closure into a `Node`
pub struct FnNode<S, F> {
    func: F,
    _state: PhantomData<fn(S) -> S>,
}

/// Wrap `func` as a node
pub fn node_fn<S, F, Fut>(func: F) -> FnNode<S, F>
where
    S: Send + 'static,
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<S, WorkflowError>> + Send,
{
    FnNode {
        func,
        _state: PhantomData,
    }
}

#[async_trait]
impl<S, F, Fut> Node<S> for FnNode<S, F>
where
    S: Send + 'static,
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<S, WorkflowError>> + Send,
{
    async fn run(&self, state: S) -> Result<S, WorkflowError> {
        (self.func)(state).await
    }
}
