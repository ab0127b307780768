//! Chat command

use anyhow::Result;
use clap::Args;
use model::{ModelCatalog, Registry};
use runtime::{AssistantConfig, Chat, MemoryStore, Message, MessageEvent};
use std::{
    io::{BufRead, Write},
    sync::Arc,
};
use tokio::sync::broadcast::error::RecvError;

/// Chat command arguments
#[derive(Debug, Args)]
pub struct ChatCmd {
    /// The model to use (defaults to the first available model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Wait for the full answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// System instructions for the assistant
    #[arg(short, long)]
    pub instructions: Option<String>,

    /// The message to send (if empty, starts interactive mode)
    pub message: Option<String>,
}

impl ChatCmd {
    /// Run the chat command
    pub async fn run(self, registry: Registry) -> Result<()> {
        let model = match &self.model {
            Some(model) => model.clone(),
            None => ModelCatalog::new(&registry).default_model().into_string(),
        };
        let store = Arc::new(MemoryStore::new());
        let config = AssistantConfig {
            instructions: self.instructions.clone(),
            stream: !self.no_stream,
            ..Default::default()
        };
        let chat = Chat::new(Arc::new(registry), store.clone(), config);

        if let Some(message) = &self.message {
            return self.send(&chat, &store, message, &model).await;
        }

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("> ");
            stdout.flush()?;

            let mut input = String::new();
            if stdin.lock().read_line(&mut input)? == 0 {
                break;
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }
            if input == "/quit" || input == "/exit" {
                break;
            }

            if let Err(e) = self.send(&chat, &store, input, &model).await {
                eprintln!("error: {e}");
            }
        }
        Ok(())
    }

    async fn send(
        &self,
        chat: &Chat,
        store: &MemoryStore,
        content: &str,
        model: &str,
    ) -> Result<()> {
        let user = chat.create_user_message(content, model)?;
        let reply = if self.no_stream {
            let reply = chat.ask_assistant(&user).await?;
            println!("{}", reply.content);
            reply
        } else {
            let reply = stream(chat, store, user).await?;
            println!();
            reply
        };

        for call in &reply.tool_calls {
            println!("-> {}({})", call.function_name, call.function_args);
        }
        Ok(())
    }
}

/// Print the assistant message as the store commits it.
async fn stream(chat: &Chat, store: &MemoryStore, user: Message) -> Result<Message> {
    let mut events = store.subscribe();
    let mut reply = chat.ask_assistant_later(user);
    let mut stdout = std::io::stdout();
    let mut printed = 0;

    let result = loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(MessageEvent::Updated(message)) if message.is_assistant() => {
                    print!("{}", message.content.get(printed..).unwrap_or_default());
                    stdout.flush()?;
                    printed = message.content.len();
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break (&mut reply).await?,
            },
            result = &mut reply => break result?,
        }
    };

    let reply = result?;
    print!("{}", reply.content.get(printed..).unwrap_or_default());
    Ok(reply)
}
