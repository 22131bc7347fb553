use std::io::Error;
use std::sync::Arc;

use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use sqlx::postgres::PgPoolOptions;
use tokio::main;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    application::{
        handlers::dispatcher::DispatchHandler,
        services::{
            channel::ChannelGateway,
            notifier::StatusNotifier,
            scheduler::SchedulerQueue,
            signing::{CallbackSigner, CallbackSignerConfig},
        },
        usecases::{
            delete_message::DeleteMessageUseCase, edit_message::EditMessageUseCase,
            get_message::GetMessageUseCase, get_message_attempts::GetMessageAttemptsUseCase,
            list_messages::ListMessagesUseCase, schedule_message::ScheduleMessageUseCase,
        },
    },
    config::Config,
    domain::repositories::{ChannelConfigRepository, GroupRepository, MessageRepository},
    infrastructure::{
        channels::{bridge::BridgeSender, email::EmailSender, sms::SmsSender},
        notify::{log::LogNotifier, nats::NatsNotifier},
        repositories::{
            in_memory::{
                InMemoryChannelConfigRepository, InMemoryGroupRepository,
                InMemoryMessageRepository,
            },
            postgres::{
                PostgresChannelConfigRepository, PostgresGroupRepository,
                PostgresMessageRepository,
            },
        },
        scheduler::{
            http_queue::{HttpQueueConfig, HttpQueueScheduler},
            in_process::InProcessScheduler,
        },
    },
    presentation::http::{
        endpoints::{
            callbacks::CallbackEndpoints, health::HealthEndpoints, messages::MessagesEndpoints,
            root::ApiState,
        },
        security::AuthConfig,
    },
};

mod application;
mod config;
mod domain;
mod infrastructure;
mod presentation;

#[main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::try_parse().map_err(Error::other)?;

    let (messages, groups, channels): (
        Arc<dyn MessageRepository>,
        Arc<dyn GroupRepository>,
        Arc<dyn ChannelConfigRepository>,
    ) = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .map_err(Error::other)?;
            sqlx::migrate!().run(&pool).await.map_err(Error::other)?;
            (
                PostgresMessageRepository::new(pool.clone()),
                PostgresGroupRepository::new(pool.clone()),
                PostgresChannelConfigRepository::new(pool),
            )
        }
        None => {
            info!("no DATABASE_URL set, using in-memory repositories");
            (
                Arc::new(InMemoryMessageRepository::new()),
                Arc::new(InMemoryGroupRepository::new()),
                Arc::new(InMemoryChannelConfigRepository::new()),
            )
        }
    };

    let gateway = ChannelGateway::new(vec![
        SmsSender::new(),
        EmailSender::new(),
        BridgeSender::new(),
    ]);

    let notifier: Arc<dyn StatusNotifier> = match &config.nats_url {
        Some(url) => NatsNotifier::connect(url).await.map_err(Error::other)?,
        None => {
            info!("no NATS_URL set, status notifications go to the log");
            LogNotifier::new()
        }
    };

    let signer = CallbackSigner::new(CallbackSignerConfig {
        secret: config.callback_secret.clone(),
    });

    let (scheduler, in_process): (Arc<dyn SchedulerQueue>, Option<Arc<InProcessScheduler>>) =
        match (&config.queue_url, &config.callback_url) {
            (Some(queue_url), Some(callback_url)) => (
                HttpQueueScheduler::new(
                    HttpQueueConfig {
                        base_url: queue_url.clone(),
                        api_token: config.queue_token.clone().unwrap_or_default(),
                        callback_url: callback_url.clone(),
                    },
                    signer.clone(),
                ),
                None,
            ),
            _ => {
                info!("no QUEUE_URL/CALLBACK_URL set, using in-process timers");
                let in_process = InProcessScheduler::new();
                (in_process.clone() as Arc<dyn SchedulerQueue>, Some(in_process))
            }
        };

    let dispatcher = Arc::new(DispatchHandler::new(
        messages.clone(),
        channels.clone(),
        gateway,
        notifier,
        scheduler.clone(),
    ));
    if let Some(in_process) = &in_process {
        in_process.attach(dispatcher.clone());
    }

    let state = Arc::new(ApiState {
        schedule_message_usecase: Arc::new(ScheduleMessageUseCase::new(
            messages.clone(),
            groups.clone(),
            scheduler.clone(),
        )),
        edit_message_usecase: Arc::new(EditMessageUseCase::new(
            messages.clone(),
            groups.clone(),
            scheduler.clone(),
        )),
        delete_message_usecase: Arc::new(DeleteMessageUseCase::new(
            messages.clone(),
            scheduler.clone(),
        )),
        get_message_usecase: Arc::new(GetMessageUseCase::new(messages.clone())),
        list_messages_usecase: Arc::new(ListMessagesUseCase::new(messages.clone())),
        get_message_attempts_usecase: Arc::new(GetMessageAttemptsUseCase::new(messages.clone())),
        dispatcher,
        signer,
        auth_config: AuthConfig {
            secret: config.auth_secret.clone(),
        },
    });

    let server_url = format!("{}://{}:{}", config.scheme, config.host, config.port);
    info!(url = %server_url, "starting server");

    let api_service = OpenApiService::new(
        (
            HealthEndpoints,
            MessagesEndpoints::new(state.clone()),
            CallbackEndpoints::new(state),
        ),
        "Outreach API",
        "0.1.0",
    )
    .server(format!("{server_url}/api"));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    Server::new(TcpListener::bind(format!("{}:{}", config.host, config.port)))
        .run(app)
        .await
}
