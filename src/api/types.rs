//! Tipos de dados trocados com a API de inventário (catálogo e tarefas)
//! e com o Tower.
//!
//! Identificadores chegam como string ou número no JSON; são sempre
//! normalizados para `String`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Payload estruturado gravado no campo `context` de uma tarefa.
pub type Context = Map<String, Value>;

/// Token de identidade do chamador, repassado em todas as chamadas remotas.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// O token carrega dados da conta; não aparece nos logs.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Identity(..)")
    }
}

/// Plano de serviço: agrupamento que aponta para uma única oferta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePlan {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub service_offering_id: Option<String>,
}

/// Oferta de serviço (job template) como vista pelo catálogo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOffering {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    /// Fonte (instância do Tower) à qual a oferta pertence.
    #[serde(deserialize_with = "de_id")]
    pub source_id: String,
    /// Identificador da oferta dentro do Tower.
    #[serde(deserialize_with = "de_id")]
    pub source_ref: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Atributos gravados pelo coletor; `extra.type` indica o tipo de job.
    #[serde(default)]
    pub extra: Option<Map<String, Value>>,
}

/// Job lançado no Tower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteJob {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    /// Status nativo do Tower (ex.: "pending", "successful").
    pub status: String,
    /// "job" ou "workflow_job". Serializado como "type" no JSON.
    #[serde(rename = "type", default = "default_job_kind")]
    pub kind: String,
}

fn default_job_kind() -> String {
    "job".to_string()
}

/// Estado do ciclo de vida de uma tarefa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Running,
    Completed,
}

/// Status visível ao chamador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Ok,
    Error,
    Pending,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Running => write!(f, "running"),
            TaskState::Completed => write!(f, "completed"),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Ok => write!(f, "ok"),
            TaskStatus::Error => write!(f, "error"),
            TaskStatus::Pending => write!(f, "pending"),
        }
    }
}

/// Atualização parcial de uma tarefa. Campos `None` não são enviados.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TaskState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_source_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
}

impl TaskUpdate {
    /// `state=running` com o status informado.
    pub fn running(status: TaskStatus) -> Self {
        Self {
            state: Some(TaskState::Running),
            status: Some(status),
            ..Default::default()
        }
    }

    /// `state=completed, status=error` com o contexto do erro.
    pub fn completed_error(context: Context) -> Self {
        Self {
            state: Some(TaskState::Completed),
            status: Some(TaskStatus::Error),
            context: Some(context),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Aponta a tarefa para o objeto criado no sistema remoto.
    pub fn with_target(
        mut self,
        source_id: impl Into<String>,
        target_source_ref: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        self.source_id = Some(source_id.into());
        self.target_source_ref = Some(target_source_ref.into());
        self.target_type = Some(target_type.into());
        self
    }
}

/// Mescla `other` em `base` de forma aditiva.
///
/// Objetos são mesclados recursivamente; qualquer outro valor em `other`
/// sobrescreve o de `base`. Chaves presentes só em `base` são mantidas.
pub fn merge_context(base: &mut Context, other: Context) {
    for (key, value) in other {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_context(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Num(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => s,
            RawId::Num(n) => n.to_string(),
        }
    }
}

/// Aceita identificadores numéricos ou string.
pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}
