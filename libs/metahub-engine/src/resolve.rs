use metahub_api::reflect::{Describable, FieldAnnotation, FieldValue, MessageDescriptor};

use crate::error::EngineError;

/// Canonical target every convertible message must declare.
pub const RECORD_TARGET: &str = "Record";

/// One source field: name, reflected value, declarative metadata.
#[derive(Debug, Clone)]
pub struct ResolvedField<'a> {
    pub name: &'static str,
    /// `None` when the field has no presence.
    pub value: Option<FieldValue<'a>>,
    /// `None` for an unmapped field.
    pub annotation: Option<FieldAnnotation>,
}

impl ResolvedField<'_> {
    pub fn is_mapped(&self) -> bool {
        self.annotation.is_some()
    }
}

/// Resolve the fields of a message that converts to a record.
///
/// Fails with [`EngineError::TargetMismatch`] when the message does not
/// declare `target = "Record"`.
pub fn resolve(message: &dyn Describable) -> Result<Vec<ResolvedField<'_>>, EngineError> {
    let descriptor = message.descriptor();
    check_target(descriptor)?;
    Ok(fields(message))
}

fn check_target(descriptor: &MessageDescriptor) -> Result<(), EngineError> {
    let target = descriptor.annotation.map(|a| a.target).unwrap_or_default();
    if target == RECORD_TARGET {
        Ok(())
    } else {
        Err(EngineError::TargetMismatch {
            schema: descriptor.full_name.to_string(),
            target: target.to_string(),
        })
    }
}

/// Every field of `message` in declaration order, with no target check.
pub fn fields(message: &dyn Describable) -> Vec<ResolvedField<'_>> {
    message
        .descriptor()
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| ResolvedField {
            name: field.name,
            value: message.field_value(index),
            annotation: field.annotation,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use metahub_api::reflect::{FieldDescriptor, MessageAnnotation, Reflect};

    use super::*;

    struct Plain {
        title: String,
        note: String,
    }

    static FIELDS: [FieldDescriptor; 2] = [
        FieldDescriptor {
            name: "title",
            annotation: Some(FieldAnnotation::new("title")),
        },
        FieldDescriptor {
            name: "note",
            annotation: None,
        },
    ];

    static TARGETED: MessageDescriptor = MessageDescriptor {
        full_name: "test.Plain",
        annotation: Some(MessageAnnotation {
            target: "Record",
            preserve_unmapped: false,
        }),
        fields: &FIELDS,
    };

    impl Describable for Plain {
        fn schema() -> &'static MessageDescriptor {
            &TARGETED
        }

        fn descriptor(&self) -> &'static MessageDescriptor {
            &TARGETED
        }

        fn field_value(&self, index: usize) -> Option<FieldValue<'_>> {
            match index {
                0 => self.title.reflect(),
                1 => self.note.reflect(),
                _ => None,
            }
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Untargeted;

    static UNTARGETED: MessageDescriptor = MessageDescriptor {
        full_name: "test.Untargeted",
        annotation: None,
        fields: &[],
    };

    impl Describable for Untargeted {
        fn schema() -> &'static MessageDescriptor {
            &UNTARGETED
        }

        fn descriptor(&self) -> &'static MessageDescriptor {
            &UNTARGETED
        }

        fn field_value(&self, _: usize) -> Option<FieldValue<'_>> {
            None
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn resolves_presence_and_annotations() {
        let plain = Plain {
            title: "T".into(),
            note: String::new(),
        };
        let fields = resolve(&plain).unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields[0].is_mapped());
        assert!(matches!(fields[0].value, Some(FieldValue::Str("T"))));
        assert!(!fields[1].is_mapped());
        assert!(fields[1].value.is_none());
    }

    #[test]
    fn missing_record_target_is_structural() {
        let err = resolve(&Untargeted).unwrap_err();
        match err {
            EngineError::TargetMismatch { schema, target } => {
                assert_eq!(schema, "test.Untargeted");
                assert_eq!(target, "");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
