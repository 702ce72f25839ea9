use async_trait::async_trait;
use deepseek_api::{
    ApiError, BalanceInfo, BalanceResponse, ChatChoice, ChatCompletionRequest,
    ChatCompletionResponse, ChatMessage, ChatRole, DeepseekApi, ModelList, RemoteModel,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scriptable in-memory stand-in for the DeepSeek API.
///
/// Counts calls per endpoint and records the last chat request so tests can assert on what
/// would have gone over the wire.
pub(crate) struct MockApi {
    models: Mutex<Vec<String>>,
    models_delay: Mutex<Duration>,
    fail_models: AtomicBool,
    model_calls: AtomicUsize,
    chat_reply: Mutex<Option<String>>,
    chat_delay: Mutex<Duration>,
    fail_chat: AtomicBool,
    chat_calls: AtomicUsize,
    last_chat: Mutex<Option<ChatCompletionRequest>>,
    balance: Mutex<Option<BalanceResponse>>,
}

impl MockApi {
    pub(crate) fn with_models(ids: &[&str]) -> Self {
        Self {
            models: Mutex::new(ids.iter().map(|id| (*id).to_string()).collect()),
            models_delay: Mutex::new(Duration::ZERO),
            fail_models: AtomicBool::new(false),
            model_calls: AtomicUsize::new(0),
            chat_reply: Mutex::new(Some("mock answer".to_string())),
            chat_delay: Mutex::new(Duration::ZERO),
            fail_chat: AtomicBool::new(false),
            chat_calls: AtomicUsize::new(0),
            last_chat: Mutex::new(None),
            balance: Mutex::new(None),
        }
    }

    pub(crate) fn set_models(&self, ids: &[&str]) {
        *self.models.lock().unwrap() = ids.iter().map(|id| (*id).to_string()).collect();
    }

    pub(crate) fn set_models_delay(&self, delay: Duration) {
        *self.models_delay.lock().unwrap() = delay;
    }

    pub(crate) fn fail_models(&self, fail: bool) {
        self.fail_models.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn model_calls(&self) -> usize {
        self.model_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_chat_reply(&self, reply: Option<&str>) {
        *self.chat_reply.lock().unwrap() = reply.map(str::to_string);
    }

    pub(crate) fn set_chat_delay(&self, delay: Duration) {
        *self.chat_delay.lock().unwrap() = delay;
    }

    pub(crate) fn fail_chat(&self, fail: bool) {
        self.fail_chat.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_chat(&self) -> Option<ChatCompletionRequest> {
        self.last_chat.lock().unwrap().clone()
    }

    pub(crate) fn set_balance(&self, balance: BalanceResponse) {
        *self.balance.lock().unwrap() = Some(balance);
    }

    pub(crate) fn sample_balance() -> BalanceResponse {
        BalanceResponse {
            is_available: true,
            balance_infos: vec![BalanceInfo {
                currency: "USD".to_string(),
                total_balance: "12.50".to_string(),
                granted_balance: "2.50".to_string(),
                topped_up_balance: "10.00".to_string(),
            }],
        }
    }
}

fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

#[async_trait]
impl DeepseekApi for MockApi {
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> deepseek_api::Result<ChatCompletionResponse> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_chat.lock().unwrap() = Some(request.clone());

        let delay = *self.chat_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_chat.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let content = self.chat_reply.lock().unwrap().clone();
        Ok(ChatCompletionResponse {
            id: "mock".to_string(),
            model: request.model.clone(),
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage {
                    role: ChatRole::Assistant,
                    content,
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        })
    }

    async fn list_models(&self) -> deepseek_api::Result<ModelList> {
        self.model_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.models_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_models.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let data = self
            .models
            .lock()
            .unwrap()
            .iter()
            .map(|id| RemoteModel {
                id: id.clone(),
                object: "model".to_string(),
                owned_by: "deepseek".to_string(),
            })
            .collect();
        Ok(ModelList {
            object: "list".to_string(),
            data,
        })
    }

    async fn balance(&self) -> deepseek_api::Result<BalanceResponse> {
        match self.balance.lock().unwrap().clone() {
            Some(balance) => Ok(balance),
            None => Err(unavailable()),
        }
    }
}
