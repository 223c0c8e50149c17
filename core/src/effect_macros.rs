//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants, in
//! particular for network calls whose outcome may be discarded.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use tasklist_core::async_effect;
///
/// async_effect! {
///     let response = http.send(request).await;
///     Some(TodoAction::ObtainTodoList(Lifecycle::settle(response)))
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Future` tagged with a cancellation id
///
/// The outcome is dropped if `Effect::Cancel` with the same id is reduced
/// before it.
///
/// # Example
///
/// ```rust,ignore
/// use tasklist_core::cancellable_effect;
///
/// cancellable_effect! {
///     id: EffectId::from_static("CREATE_TODO"),
///     async {
///         let task = create_task(&http, &api, new_task).await;
///         Some(TodoAction::CreateTodo(Lifecycle::settle(task)))
///     }
/// }
/// ```
#[macro_export]
macro_rules! cancellable_effect {
    (
        id: $id:expr,
        async { $($body:tt)* }
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            effect: ::std::boxed::Box::new($crate::async_effect! { $($body)* }),
        }
    };
}
