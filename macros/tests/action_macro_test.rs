//! Tests for #[derive(Action)] macro

use tasklist_core::action::{create_actions, ActionType, EntitySpec, Lifecycle, Stage};
use tasklist_core::effect::EffectId;
use tasklist_macros::Action;

#[derive(Action, Clone, Debug, PartialEq)]
enum TodoAction {
    ObtainTodoList(Lifecycle<(), Vec<String>, String>),
    CreateTodo(Lifecycle<String, String, String>),
    UpdateTodo(Lifecycle<String, String, String>),
    RemoveTodo(Lifecycle<String, String, String>),

    #[plain]
    Reset,

    #[plain]
    Select { id: String },
}

#[test]
fn test_operation_names() {
    assert_eq!(TodoAction::CreateTodo(Lifecycle::Discard).operation(), "CREATE_TODO");
    assert_eq!(
        TodoAction::ObtainTodoList(Lifecycle::Discard).operation(),
        "OBTAIN_TODO_LIST"
    );
    assert_eq!(TodoAction::Reset.operation(), "RESET");
    assert_eq!(
        TodoAction::OPERATIONS,
        &[
            "OBTAIN_TODO_LIST",
            "CREATE_TODO",
            "UPDATE_TODO",
            "REMOVE_TODO",
            "RESET",
            "SELECT"
        ]
    );
}

#[test]
fn test_stage_predicates() {
    let request = TodoAction::CreateTodo(Lifecycle::Request("Buy milk".to_string()));
    assert_eq!(request.stage(), Some(Stage::Request));
    assert!(request.is_request());
    assert!(!request.is_settled());

    let discard = TodoAction::RemoveTodo(Lifecycle::Discard);
    assert!(discard.is_discard());

    let failure = TodoAction::UpdateTodo(Lifecycle::Failure("boom".to_string()));
    assert!(failure.is_settled());
    assert!(!failure.is_request());

    let plain = TodoAction::Select { id: "1".to_string() };
    assert_eq!(plain.stage(), None);
    assert!(!plain.is_request() && !plain.is_discard() && !plain.is_settled());
}

#[test]
fn test_action_type_strings() {
    assert_eq!(
        TodoAction::ObtainTodoList(Lifecycle::Success(vec![]))
            .action_type()
            .to_string(),
        "OBTAIN_TODO_LIST.SUCCESS"
    );
    assert_eq!(TodoAction::Reset.action_type().to_string(), "RESET");
}

#[test]
fn test_effect_id_is_operation() {
    assert_eq!(
        TodoAction::CreateTodo(Lifecycle::Discard).effect_id(),
        EffectId::from_static("CREATE_TODO")
    );
}

#[test]
fn test_types_agree_with_runtime_factory() {
    let factory = create_actions(&[
        ("todo", EntitySpec::Verbs(&["create", "update", "remove"])),
        ("todoList", EntitySpec::Verbs(&["obtain"])),
    ]);

    let typed = [
        ("obtainTodoList", TodoAction::ObtainTodoList(Lifecycle::Discard)),
        ("createTodo", TodoAction::CreateTodo(Lifecycle::Discard)),
        ("updateTodo", TodoAction::UpdateTodo(Lifecycle::Discard)),
        ("removeTodo", TodoAction::RemoveTodo(Lifecycle::Discard)),
    ];

    for (key, action) in typed {
        let lifecycle = factory.lifecycle(key).unwrap_or_else(|| unreachable!("{key} registered"));
        assert_eq!(lifecycle.operation(), action.operation());
        for stage in Stage::ALL {
            assert_eq!(
                lifecycle.get(stage).action_type(),
                &ActionType::from_operation(action.operation(), Some(stage))
            );
        }
    }
}

#[test]
fn test_digit_entities_agree_with_runtime_factory() {
    #[derive(Action, Debug)]
    enum Archive {
        ObtainTodo2List(Lifecycle<(), u32, String>),
    }

    let factory = create_actions(&[("todo2List", EntitySpec::Verbs(&["obtain"]))]);
    let lifecycle = factory
        .lifecycle("obtainTodo2List")
        .unwrap_or_else(|| unreachable!("obtainTodo2List registered"));
    let action = Archive::ObtainTodo2List(Lifecycle::Request(()));

    assert_eq!(action.operation(), "OBTAIN_TODO_2_LIST");
    assert_eq!(lifecycle.request.action_type(), &action.action_type());
}

#[test]
fn test_generic_enum() {
    #[derive(Action, Debug)]
    enum Fetch<T> {
        FetchItem(Lifecycle<u32, T, String>),
    }

    let action: Fetch<String> = Fetch::FetchItem(Lifecycle::Success("x".to_string()));
    assert_eq!(action.action_type().to_string(), "FETCH_ITEM.SUCCESS");
}
