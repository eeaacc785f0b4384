//! Command registry and dispatcher through the public API

use std::sync::Arc;

use tether::commands::{
    CommandDispatcher, CommandRegistry, CommandSpec, DispatchOutcome, handler,
    register_builtin_commands,
};
use tether::random::SharedRng;
use tether::testing::MockSession;
use tether::{BotError, PlayerName, SessionId, SessionLink};
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

fn registry_with_echo() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    assert_ok!(register_builtin_commands(&mut registry));
    assert_ok!(registry.register(CommandSpec::new(
        "echo",
        "Repeat each argument on its own line",
        "echo <words...>",
        handler(|ctx| async move {
            for arg in &ctx.args {
                ctx.reply(format!("[{arg}]"))?;
            }
            Ok::<(), BotError>(())
        }),
    )));
    registry
}

fn bound(prefix: &str) -> (CommandDispatcher, Arc<MockSession>, CancellationToken) {
    let session = Arc::new(MockSession::new("Keeper"));
    let lifetime = CancellationToken::new();
    let mut dispatcher =
        CommandDispatcher::new(Arc::new(registry_with_echo()), prefix, SharedRng::seeded(3));
    dispatcher.bind(
        SessionLink::new(SessionId::new(), session.clone(), lifetime.clone()),
        Instant::now(),
    );
    (dispatcher, session, lifetime)
}

#[test]
fn test_custom_command_cannot_shadow_builtin() {
    let mut registry = registry_with_echo();
    let err = assert_err!(registry.register(CommandSpec::new(
        "HELP",
        "shadow",
        "help",
        handler(|_ctx| async { Ok(()) }),
    )));
    assert!(matches!(err, BotError::DuplicateCommand(_)));
    assert_eq!(registry.len(), 11);
}

#[tokio::test]
async fn test_custom_prefix_and_quoted_arguments() {
    let (dispatcher, session, _lifetime) = bound("?");
    let steve = PlayerName::new("Steve");

    assert!(matches!(dispatcher.dispatch(&steve, "!echo a"), DispatchOutcome::Ignored));
    let outcome = dispatcher.dispatch(&steve, r#"?ECHO one "two words" 'three'"#);
    assert_eq!(outcome.finished().await, Some(true));

    assert_eq!(session.chats(), vec!["[one]", "[two words]", "[three]"]);
}

#[tokio::test]
async fn test_unknown_command_names_the_prefix() {
    let (dispatcher, session, _lifetime) = bound("?");

    let outcome = dispatcher.dispatch(&PlayerName::new("Steve"), "?dance now");

    assert!(matches!(outcome, DispatchOutcome::UnknownCommand(ref name) if name == "dance"));
    assert_eq!(
        session.chats(),
        vec!["Unknown command: dance. Type ?help for available commands."]
    );
}

#[tokio::test]
async fn test_revoked_session_gets_no_error_reply() {
    let (dispatcher, session, lifetime) = bound("!");
    lifetime.cancel();

    let outcome = dispatcher.dispatch(&PlayerName::new("Steve"), "!echo late");

    assert_eq!(outcome.finished().await, Some(false));
    assert!(session.chats().is_empty());
}

#[tokio::test]
async fn test_unbound_dispatcher_ignores_commands() {
    let (mut dispatcher, session, _lifetime) = bound("!");
    dispatcher.unbind();

    let outcome = dispatcher.dispatch(&PlayerName::new("Steve"), "!help");

    assert!(matches!(outcome, DispatchOutcome::Ignored));
    assert!(session.chats().is_empty());
}
