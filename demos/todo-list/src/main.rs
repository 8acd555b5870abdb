//! Todo-list demo for the Glint RPC framework.
//!
//! ## Usage
//!
//! ```bash
//! # Start the demo server
//! todo-list serve -b 127.0.0.1:4430
//!
//! # Make calls against it
//! todo-list call -a 127.0.0.1:4430 create_todo_list '{"title": "Home", "text": "chores", "user_id": 1}'
//! todo-list call -a 127.0.0.1:4430 create_task '{"task_list_id": 1, "task_type": ["URGENT"], "title": "Buy milk", "text": null}'
//! todo-list call -a 127.0.0.1:4430 get_todo_list '{"id": 1}'
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use argh::FromArgs;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use glint_client::Client;
use glint_common::protocol::{GlintError, Request};
use glint_server::{MethodTable, Server, ServerConfig, TypedRequest, User};

#[derive(FromArgs)]
/// Todo-list example application for Glint.
struct TopLevel {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Serve(ServeArgs),
    Call(CallArgs),
}

#[derive(FromArgs)]
/// Start the todo-list server.
#[argh(subcommand, name = "serve")]
struct ServeArgs {
    /// address to bind to
    #[argh(option, short = 'b', default = "\"127.0.0.1:4430\".parse().unwrap()")]
    bind: SocketAddr,

    /// log full message bodies (debugging only)
    #[argh(switch)]
    log_messages: bool,
}

#[derive(FromArgs)]
/// Call a method on a running todo-list server.
#[argh(subcommand, name = "call")]
struct CallArgs {
    /// server address
    #[argh(option, short = 'a', default = "\"127.0.0.1:4430\".parse().unwrap()")]
    addr: SocketAddr,

    /// method name
    #[argh(positional)]
    method: String,

    /// JSON payload object
    #[argh(positional, default = "String::from(\"{}\")")]
    payload: String,
}

// ---------------------------------------------------------------------------
// Domain model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
struct TodoList {
    id: u64,
    title: String,
    text: String,
    user_id: u64,
    tasks: Vec<u64>,
}

#[derive(Debug, Clone, Serialize)]
struct Task {
    id: u64,
    task_list_id: u64,
    task_type: Vec<String>,
    title: String,
    text: Option<String>,
    completion_percent: f64,
}

#[derive(Debug, Default)]
struct Store {
    next_id: u64,
    lists: HashMap<u64, TodoList>,
    tasks: HashMap<u64, Task>,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn domain_error(reason: impl Into<String>) -> GlintError {
    GlintError::MethodInternal {
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Method payloads (the typed request shapes the original generated as DTOs)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CreateTodoListPayload {
    title: String,
    text: String,
    user_id: u64,
}

#[derive(Deserialize)]
struct GetTodoListPayload {
    id: u64,
}

#[derive(Deserialize)]
struct CreateTaskPayload {
    task_list_id: u64,
    task_type: Vec<String>,
    title: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct CompleteTaskPayload {
    task_id: u64,
}

#[derive(Deserialize)]
struct DeleteTaskPayload {
    task_id: u64,
}

fn todo_methods(store: Arc<Mutex<Store>>) -> MethodTable {
    let mut methods = MethodTable::new();

    {
        let store = Arc::clone(&store);
        methods.register(
            "create_todo_list",
            move |request: TypedRequest<CreateTodoListPayload>, _user: User| {
                let store = Arc::clone(&store);
                async move {
                    let mut store = store.lock().unwrap();
                    let id = store.next_id();
                    let list = TodoList {
                        id,
                        title: request.payload.title.clone(),
                        text: request.payload.text.clone(),
                        user_id: request.payload.user_id,
                        tasks: Vec::new(),
                    };
                    store.lists.insert(id, list.clone());
                    request.ok_with(&list)
                }
            },
        );
    }

    {
        let store = Arc::clone(&store);
        methods.register(
            "get_todo_list",
            move |request: TypedRequest<GetTodoListPayload>, _user: User| {
                let store = Arc::clone(&store);
                async move {
                    let store = store.lock().unwrap();
                    let list = store
                        .lists
                        .get(&request.payload.id)
                        .ok_or_else(|| domain_error("no such todo list"))?
                        .clone();
                    let tasks: Vec<&Task> = list
                        .tasks
                        .iter()
                        .filter_map(|id| store.tasks.get(id))
                        .collect();
                    request.ok_with(&json!({"list": list, "tasks": tasks}))
                }
            },
        );
    }

    {
        let store = Arc::clone(&store);
        methods.register(
            "create_task",
            move |request: TypedRequest<CreateTaskPayload>, _user: User| {
                let store = Arc::clone(&store);
                async move {
                    let mut store = store.lock().unwrap();
                    if !store.lists.contains_key(&request.payload.task_list_id) {
                        return Err(domain_error("no such todo list"));
                    }
                    let id = store.next_id();
                    let task = Task {
                        id,
                        task_list_id: request.payload.task_list_id,
                        task_type: request.payload.task_type.clone(),
                        title: request.payload.title.clone(),
                        text: request.payload.text.clone(),
                        completion_percent: 0.0,
                    };
                    store.tasks.insert(id, task.clone());
                    store
                        .lists
                        .get_mut(&task.task_list_id)
                        .unwrap()
                        .tasks
                        .push(id);
                    request.ok_with(&task)
                }
            },
        );
    }

    {
        let store = Arc::clone(&store);
        methods.register(
            "complete_task",
            move |request: TypedRequest<CompleteTaskPayload>, _user: User| {
                let store = Arc::clone(&store);
                async move {
                    let mut store = store.lock().unwrap();
                    let task = store
                        .tasks
                        .get_mut(&request.payload.task_id)
                        .ok_or_else(|| domain_error("no such task"))?;
                    task.completion_percent = 100.0;
                    let task = task.clone();
                    request.ok_with(&task)
                }
            },
        );
    }

    {
        let store = Arc::clone(&store);
        methods.register(
            "delete_task",
            move |request: TypedRequest<DeleteTaskPayload>, _user: User| {
                let store = Arc::clone(&store);
                async move {
                    let mut store = store.lock().unwrap();
                    let task = store
                        .tasks
                        .remove(&request.payload.task_id)
                        .ok_or_else(|| domain_error("no such task"))?;
                    if let Some(list) = store.lists.get_mut(&task.task_list_id) {
                        list.tasks.retain(|id| *id != task.id);
                    }
                    request.ok_with(&json!({"deleted": task.id}))
                }
            },
        );
    }

    methods
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

async fn serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        host: args.bind.ip().to_string(),
        port: args.bind.port(),
        log_messages: args.log_messages,
        ..ServerConfig::default()
    };

    let store = Arc::new(Mutex::new(Store::default()));
    let server = Arc::new(Server::bind(config, todo_methods(store)).await?);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, exiting");
        }
    }
    Ok(())
}

async fn call(args: CallArgs) -> Result<()> {
    let payload: Value = serde_json::from_str(&args.payload)
        .map_err(|err| anyhow!("payload is not valid JSON: {err}"))?;

    let client = Client::new(args.addr.ip().to_string(), args.addr.port());
    client.connect().await?;

    let request = Request::from_payload(&args.method, &payload)?;
    let response = client.send(request).await?;

    println!(
        "{} [{}]",
        response.method_name,
        if response.success { "ok" } else { "err" }
    );
    println!("{}", serde_json::to_string_pretty(&response.payload)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: TopLevel = argh::from_env();
    match args.command {
        Command::Serve(args) => serve(args).await,
        Command::Call(args) => call(args).await,
    }
}
