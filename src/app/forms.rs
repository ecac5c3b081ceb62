//! Form state for the login/register pages and the admin "add winery" form

use anyhow::{bail, Context, Result};

use crate::models::{Credentials, NewWinery, Registration};

/// Focused field on the login/register forms
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum AuthField {
    #[default]
    Username,
    Password,
    /// Register page only
    AdminFlag,
}

#[derive(Clone, Debug, Default)]
pub struct AuthForm {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
    pub field: AuthField,
}

impl AuthForm {
    /// Cycle fields; the admin checkbox only exists on the register page
    pub fn next_field(&mut self, with_admin_flag: bool) {
        self.field = match self.field {
            AuthField::Username => AuthField::Password,
            AuthField::Password if with_admin_flag => AuthField::AdminFlag,
            AuthField::Password | AuthField::AdminFlag => AuthField::Username,
        };
    }

    pub fn text(&self) -> Option<&String> {
        match self.field {
            AuthField::Username => Some(&self.username),
            AuthField::Password => Some(&self.password),
            AuthField::AdminFlag => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            AuthField::Username => Some(&mut self.username),
            AuthField::Password => Some(&mut self.password),
            AuthField::AdminFlag => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        }
    }

    pub fn registration(&self) -> Registration {
        Registration {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            is_admin: self.is_admin,
        }
    }
}

/// Focused field on the add-winery form
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum WineryField {
    #[default]
    Name,
    Description,
    Latitude,
    Longitude,
}

impl WineryField {
    pub fn next(&self) -> WineryField {
        match self {
            WineryField::Name => WineryField::Description,
            WineryField::Description => WineryField::Latitude,
            WineryField::Latitude => WineryField::Longitude,
            WineryField::Longitude => WineryField::Name,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WineryField::Name => "Name",
            WineryField::Description => "Description",
            WineryField::Latitude => "Latitude",
            WineryField::Longitude => "Longitude",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct WineryForm {
    pub open: bool,
    pub name: String,
    pub description: String,
    pub latitude: String,
    pub longitude: String,
    pub field: WineryField,
}

impl WineryForm {
    pub fn get(&self, field: WineryField) -> &String {
        match field {
            WineryField::Name => &self.name,
            WineryField::Description => &self.description,
            WineryField::Latitude => &self.latitude,
            WineryField::Longitude => &self.longitude,
        }
    }

    pub fn current_mut(&mut self) -> &mut String {
        match self.field {
            WineryField::Name => &mut self.name,
            WineryField::Description => &mut self.description,
            WineryField::Latitude => &mut self.latitude,
            WineryField::Longitude => &mut self.longitude,
        }
    }

    /// Validate the typed values into a create payload
    pub fn to_new_winery(&self) -> Result<NewWinery> {
        let name = self.name.trim();
        if name.is_empty() {
            bail!("Name is required");
        }
        let latitude: f64 = self
            .latitude
            .trim()
            .parse()
            .context("Latitude must be a decimal number")?;
        let longitude: f64 = self
            .longitude
            .trim()
            .parse()
            .context("Longitude must be a decimal number")?;
        if !(-90.0..=90.0).contains(&latitude) {
            bail!("Latitude must be between -90 and 90");
        }
        if !(-180.0..=180.0).contains(&longitude) {
            bail!("Longitude must be between -180 and 180");
        }
        Ok(NewWinery {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            latitude,
            longitude,
        })
    }

    /// Clear values and collapse
    pub fn reset(&mut self) {
        *self = WineryForm::default();
    }
}
