//! Lifecycle and admin hooks invoked by the host application.
//!
//! # Invariants
//! - These hooks are the only entry points the host calls.
//! - Views never write; actions write at most once.

use crate::admin::route::AdminRoute;
use crate::input::extract::RequestFields;
use crate::repo::config_store::ConfigDocumentStore;
use crate::service::error::{RegistryResult, RoutingError, ValidationError};
use crate::service::registry_service::{
    update_rule, EntryListing, FetchedEntry, RegistryService, FIELD_NAME, FIELD_PREV_NAME,
};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

/// Request field carrying the search box text of the list view.
pub const FIELD_SEARCH: &str = "point-name";

const VIEW_PARAM: &str = "view";
const PARAM_PARAM: &str = "param";

/// Admin view selected by the `{view}` path segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum AdminView {
    /// `""`: searchable list of entry names.
    Search(EntryListing),
    /// `edit`: one entry's spec.
    Edit(FetchedEntry),
    /// `help`: static usage notes.
    Help(HelpPage),
}

/// Static help content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpPage {
    pub module_name: String,
    /// Free-form `{param}` segment, echoed back.
    pub topic: String,
    pub actions: Vec<&'static str>,
    pub save_fields: Vec<&'static str>,
    pub search_field: &'static str,
}

/// Mutating admin action named by the host's `_action` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    New,
    Save,
    Rename,
}

impl AdminAction {
    pub const ALL: [AdminAction; 3] = [Self::New, Self::Save, Self::Rename];

    pub fn parse(raw: &str) -> Result<Self, RoutingError> {
        match raw {
            "new" => Ok(Self::New),
            "save" => Ok(Self::Save),
            "rename" => Ok(Self::Rename),
            other => Err(RoutingError::UnknownAction(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Save => "save",
            Self::Rename => "rename",
        }
    }
}

/// Hook surface of the display editor module.
pub struct DisplayEditorHooks<S: ConfigDocumentStore> {
    service: RegistryService<S>,
    route: AdminRoute,
}

impl<S: ConfigDocumentStore> DisplayEditorHooks<S> {
    pub fn new(service: RegistryService<S>) -> RegistryResult<Self> {
        let route = AdminRoute::compile(&service.config().admin_route_template())?;
        Ok(Self { service, route })
    }

    pub fn service(&self) -> &RegistryService<S> {
        &self.service
    }

    pub fn install(&self) -> RegistryResult<()> {
        self.service.install()
    }

    pub fn uninstall(&self) -> RegistryResult<()> {
        self.service.uninstall()
    }

    /// Runs the mutating admin `action` with the submitted `input`.
    pub fn handle_admin_action(&self, action: &str, input: &RequestFields) -> RegistryResult<()> {
        let action = AdminAction::parse(action).inspect_err(|err| {
            warn!("event=admin_action module=admin status=rejected error={err}");
        })?;
        debug!(
            "event=admin_action module=admin status=start action={}",
            action.as_str()
        );
        match action {
            AdminAction::New => {
                let name = optional_str(input, FIELD_NAME)?.ok_or(ValidationError::MissingName)?;
                self.service.create_entry(name)
            }
            AdminAction::Save => self.service.update_entry(input),
            AdminAction::Rename => {
                let prev_name =
                    optional_str(input, FIELD_PREV_NAME)?.ok_or(ValidationError::MissingName)?;
                let name = optional_str(input, FIELD_NAME)?.ok_or(ValidationError::MissingName)?;
                self.service.rename_entry(prev_name, name)
            }
        }
    }

    /// Resolves `path` and renders the selected read-only view.
    pub fn handle_admin_view(&self, path: &str, input: &RequestFields) -> RegistryResult<AdminView> {
        let params = self.route.resolve(path)?;
        let param = params.get(PARAM_PARAM);
        match params.get(VIEW_PARAM) {
            "" => {
                let search = optional_str(input, FIELD_SEARCH)?.unwrap_or_default();
                Ok(AdminView::Search(self.service.list_entries(search)?))
            }
            "edit" => Ok(AdminView::Edit(self.service.fetch_entry(param)?)),
            "help" => Ok(AdminView::Help(self.help_page(param))),
            other => Err(RoutingError::UnknownView(other.to_string()).into()),
        }
    }

    fn help_page(&self, topic: &str) -> HelpPage {
        HelpPage {
            module_name: self.service.config().module_name.clone(),
            topic: topic.to_string(),
            actions: AdminAction::ALL.iter().map(|action| action.as_str()).collect(),
            save_fields: update_rule().required().collect(),
            search_field: FIELD_SEARCH,
        }
    }
}

/// Reads an optional string field; other value types are rejected.
fn optional_str<'a>(
    input: &'a RequestFields,
    field: &'static str,
) -> Result<Option<&'a str>, ValidationError> {
    match input.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(other) => Err(ValidationError::InvalidName {
            name: other.to_string(),
            reason: "must be a string",
        }),
    }
}
