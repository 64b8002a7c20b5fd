use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::{
    config::Region,
    error::DisplayErrorContext,
    types::{
        AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput, ReturnValue,
        ScalarAttributeType, TableStatus,
    },
    Client,
};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::Config;
use crate::domain::{
    repository::{TableAdmin, TableState, TodoRepository},
    todo::{Todo, TodoChanges, TodoId},
};

type Item = HashMap<String, AttributeValue>;

const READ_CAPACITY_UNITS: i64 = 5;
const WRITE_CAPACITY_UNITS: i64 = 5;

/// Builds the SDK client from the configured region, honouring an explicit
/// endpoint (DynamoDB Local) when one is set.
pub async fn connect(config: &Config) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.aws_region.clone()));
    if let Some(endpoint) = config.dynamodb_endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
        loader = loader.endpoint_url(endpoint);
    }
    Client::new(&loader.load().await)
}

#[derive(Clone)]
pub struct DynamoTodoRepository {
    client: Client,
    table: String,
}

impl DynamoTodoRepository {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self { client, table: table.into() }
    }
}

#[async_trait]
impl TodoRepository for DynamoTodoRepository {
    async fn get(&self, id: &TodoId) -> Result<Option<Todo>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("id", AttributeValue::S(id.0.clone()))
            .send()
            .await
            .map_err(sdk_error)?;
        output.item().map(todo_from_item).transpose()
    }

    async fn put(&self, todo: &Todo) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(todo_to_item(todo)))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn update(&self, id: &TodoId, changes: &TodoChanges) -> Result<Option<Todo>> {
        let (expression, names, values) = update_expression(changes);
        let result = self
            .client
            .update_item()
            .table_name(&self.table)
            .key("id", AttributeValue::S(id.0.clone()))
            .update_expression(expression)
            .condition_expression("attribute_exists(#id)")
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;
        match result {
            Ok(output) => output.attributes().map(todo_from_item).transpose(),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_conditional_check_failed_exception()) => Ok(None),
            Err(e) => Err(sdk_error(e)),
        }
    }

    async fn delete(&self, id: &TodoId) -> Result<Option<Todo>> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table)
            .key("id", AttributeValue::S(id.0.clone()))
            // Old attributes are only returned when a record was actually removed.
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(sdk_error)?;
        output.attributes().map(todo_from_item).transpose()
    }

    async fn scan(&self, completed: Option<bool>) -> Result<Vec<Todo>> {
        let mut todos = Vec::new();
        let mut start_key: Option<Item> = None;
        loop {
            let mut request = self.client.scan().table_name(&self.table).set_exclusive_start_key(start_key.take());
            if let Some(flag) = completed {
                request = request
                    .filter_expression(completed_filter(flag))
                    .expression_attribute_names("#is_complete", "is_complete")
                    .expression_attribute_values(":is_complete", AttributeValue::Bool(flag));
            }
            let output = request.send().await.map_err(sdk_error)?;
            for item in output.items() {
                todos.push(todo_from_item(item)?);
            }
            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }
        Ok(todos)
    }
}

#[async_trait]
impl TableAdmin for DynamoTodoRepository {
    async fn describe_table(&self) -> Result<Option<TableState>> {
        match self.client.describe_table().table_name(&self.table).send().await {
            Ok(output) => {
                let state = match output.table().and_then(|t| t.table_status()) {
                    Some(TableStatus::Active) => TableState::Active,
                    Some(TableStatus::Creating) => TableState::Creating,
                    Some(other) => TableState::Other(other.as_str().to_string()),
                    None => TableState::Other("UNKNOWN".into()),
                };
                Ok(Some(state))
            }
            Err(e) if e.as_service_error().is_some_and(|se| se.is_resource_not_found_exception()) => Ok(None),
            Err(e) => Err(sdk_error(e)),
        }
    }

    async fn create_table(&self) -> Result<()> {
        let result = self
            .client
            .create_table()
            .table_name(&self.table)
            .key_schema(KeySchemaElement::builder().attribute_name("id").key_type(KeyType::Hash).build()?)
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name("id")
                    .attribute_type(ScalarAttributeType::S)
                    .build()?,
            )
            .provisioned_throughput(
                ProvisionedThroughput::builder()
                    .read_capacity_units(READ_CAPACITY_UNITS)
                    .write_capacity_units(WRITE_CAPACITY_UNITS)
                    .build()?,
            )
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            // Another instance won the race; it is being created already.
            Err(e) if e.as_service_error().is_some_and(|se| se.is_resource_in_use_exception()) => Ok(()),
            Err(e) => Err(sdk_error(e)),
        }
    }

    fn table_name(&self) -> &str { &self.table }
}

fn sdk_error<E: std::error::Error>(e: E) -> anyhow::Error {
    anyhow!("{}", DisplayErrorContext(e))
}

fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn todo_to_item(todo: &Todo) -> Item {
    HashMap::from([
        ("id".to_string(), AttributeValue::S(todo.id.0.clone())),
        ("title".to_string(), AttributeValue::S(todo.title.clone())),
        ("description".to_string(), AttributeValue::S(todo.description.clone())),
        ("is_complete".to_string(), AttributeValue::Bool(todo.is_complete)),
        ("due_date".to_string(), AttributeValue::S(format_time(&todo.due_date))),
        ("created_at".to_string(), AttributeValue::S(format_time(&todo.created_at))),
        ("updated_at".to_string(), AttributeValue::S(format_time(&todo.updated_at))),
    ])
}

fn string_attr<'a>(item: &'a Item, name: &str) -> Result<Option<&'a str>> {
    match item.get(name) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::S(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(anyhow!("attribute `{name}` has unexpected type: {other:?}")),
    }
}

fn required_string(item: &Item, name: &str) -> Result<String> {
    string_attr(item, name)?.map(str::to_string).ok_or_else(|| anyhow!("attribute `{name}` is missing"))
}

fn time_attr(item: &Item, name: &str) -> Result<Option<DateTime<Utc>>> {
    string_attr(item, name)?
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .with_context(|| format!("attribute `{name}` is not an RFC 3339 timestamp: {raw}"))
        })
        .transpose()
}

/// Items without `is_complete` read back as pending, so the `false` filter matches them too.
fn completed_filter(flag: bool) -> &'static str {
    if flag {
        "#is_complete = :is_complete"
    } else {
        "#is_complete = :is_complete OR attribute_not_exists(#is_complete)"
    }
}

fn todo_from_item(item: &Item) -> Result<Todo> {
    let id = required_string(item, "id")?;
    let is_complete = match item.get("is_complete") {
        None | Some(AttributeValue::Null(_)) => false,
        Some(AttributeValue::Bool(b)) => *b,
        Some(other) => return Err(anyhow!("attribute `is_complete` has unexpected type: {other:?}")),
    };
    let updated_at = time_attr(item, "updated_at")?.ok_or_else(|| anyhow!("attribute `updated_at` is missing"))?;
    Ok(Todo {
        title: required_string(item, "title")?,
        description: required_string(item, "description")?,
        is_complete,
        due_date: time_attr(item, "due_date")?.ok_or_else(|| anyhow!("attribute `due_date` is missing"))?,
        // Replacements written by older deployments carry no creation time.
        created_at: time_attr(item, "created_at")?.unwrap_or(updated_at),
        updated_at,
        id: TodoId(id),
    })
}

/// `SET` expression covering the supplied fields plus `updated_at`. Every
/// attribute goes through a name placeholder to stay clear of reserved words.
fn update_expression(changes: &TodoChanges) -> (String, HashMap<String, String>, Item) {
    let mut sets = Vec::new();
    let mut names = HashMap::from([("#id".to_string(), "id".to_string())]);
    let mut values = Item::new();
    let mut set = |field: &str, value: AttributeValue| {
        sets.push(format!("#{field} = :{field}"));
        names.insert(format!("#{field}"), field.to_string());
        values.insert(format!(":{field}"), value);
    };
    if let Some(title) = &changes.title { set("title", AttributeValue::S(title.clone())); }
    if let Some(description) = &changes.description { set("description", AttributeValue::S(description.clone())); }
    if let Some(done) = changes.is_complete { set("is_complete", AttributeValue::Bool(done)); }
    if let Some(due) = &changes.due_date { set("due_date", AttributeValue::S(format_time(due))); }
    set("updated_at", AttributeValue::S(format_time(&changes.updated_at)));
    (format!("SET {}", sets.join(", ")), names, values)
}
