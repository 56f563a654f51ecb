//! Start-activity form

use tui_input::{Input, InputRequest};

use crate::activity::{ActivityCatalog, NewActivity};

/// Form field types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    DogId,
    ActivityType,
    Notes,
}

impl FormField {
    pub fn all() -> Vec<FormField> {
        vec![FormField::DogId, FormField::ActivityType, FormField::Notes]
    }

    pub fn next(&self) -> FormField {
        match self {
            FormField::DogId => FormField::ActivityType,
            FormField::ActivityType => FormField::Notes,
            FormField::Notes => FormField::DogId,
        }
    }

    pub fn previous(&self) -> FormField {
        match self {
            FormField::DogId => FormField::Notes,
            FormField::ActivityType => FormField::DogId,
            FormField::Notes => FormField::ActivityType,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::DogId => "Dog",
            FormField::ActivityType => "Activity",
            FormField::Notes => "Notes",
        }
    }
}

/// An activity type the form can offer
#[derive(Debug, Clone, PartialEq)]
pub struct TypeOption {
    pub code: String,
    pub label: String,
    pub color: String,
}

/// Form data for starting an activity
#[derive(Debug, Clone)]
pub struct StartForm {
    pub dog_id: Input,
    pub notes: Input,
    pub options: Vec<TypeOption>,
    pub selected_type: usize,
    pub current_field: FormField,
}

impl StartForm {
    /// Offer the quick-log types, or every type if none are flagged
    pub fn new(catalog: &ActivityCatalog) -> Self {
        let quick = catalog.quick_log();
        let defs: Vec<_> = if quick.is_empty() {
            catalog.definitions().iter().collect()
        } else {
            quick
        };

        let options = defs
            .into_iter()
            .map(|d| TypeOption {
                code: d.code.clone(),
                label: d.label.clone(),
                color: d.color.clone(),
            })
            .collect();

        Self {
            dog_id: Input::default(),
            notes: Input::default(),
            options,
            selected_type: 0,
            current_field: FormField::DogId,
        }
    }

    pub fn next_field(&mut self) {
        self.current_field = self.current_field.next();
    }

    pub fn previous_field(&mut self) {
        self.current_field = self.current_field.previous();
    }

    pub fn select_next_type(&mut self) {
        if !self.options.is_empty() {
            self.selected_type = (self.selected_type + 1) % self.options.len();
        }
    }

    pub fn select_previous_type(&mut self) {
        if !self.options.is_empty() {
            self.selected_type = self
                .selected_type
                .checked_sub(1)
                .unwrap_or(self.options.len() - 1);
        }
    }

    /// Select by 1-based shortcut digit
    pub fn select_type_by_digit(&mut self, digit: u32) {
        let index = digit as usize;
        if index >= 1 && index <= self.options.len() {
            self.selected_type = index - 1;
        }
    }

    pub fn selected_option(&self) -> Option<&TypeOption> {
        self.options.get(self.selected_type)
    }

    /// Route an editing request to the focused text field
    pub fn edit(&mut self, request: InputRequest) {
        let input = match self.current_field {
            FormField::DogId => &mut self.dog_id,
            FormField::Notes => &mut self.notes,
            FormField::ActivityType => return,
        };
        input.handle(request);
    }

    pub fn field_value(&self, field: FormField) -> String {
        match field {
            FormField::DogId => self.dog_id.value().to_string(),
            FormField::ActivityType => self
                .selected_option()
                .map(|o| format!("{} ({})", o.label, o.code))
                .unwrap_or_default(),
            FormField::Notes => self.notes.value().to_string(),
        }
    }

    /// Build the request, or explain what is missing
    pub fn to_new_activity(&self) -> Result<NewActivity, String> {
        let dog_id = self.dog_id.value().trim().to_string();
        if dog_id.is_empty() {
            return Err("Dog id is required".to_string());
        }
        let option = self
            .selected_option()
            .ok_or_else(|| "No activity types available".to_string())?;
        let notes = self.notes.value().trim().to_string();

        Ok(NewActivity {
            dog_id,
            activity_type_code: option.code.clone(),
            notes: if notes.is_empty() { None } else { Some(notes) },
            custom_type_id: None,
        })
    }
}


// Made with Bob
