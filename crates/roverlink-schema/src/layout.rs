use crate::field::FieldSpec;

/// Ordered field layout of one frame direction.
///
/// The last field is always the checksum. `checksum_fields` lists, in
/// ascending order, the integer fields whose values are summed into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub fields: &'static [FieldSpec],
    pub checksum_fields: &'static [usize],
}

impl FrameLayout {
    /// Total number of fields, checksum included.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Index of the checksum field.
    pub fn checksum_index(&self) -> usize {
        self.fields.len().saturating_sub(1)
    }

    /// The checksum field itself.
    pub fn checksum_field(&self) -> &'static FieldSpec {
        &self.fields[self.checksum_index()]
    }

    /// Fields a caller supplies values for, i.e. all but the checksum.
    pub fn value_fields(&self) -> &'static [FieldSpec] {
        &self.fields[..self.checksum_index()]
    }

    /// Look a field up by semantic name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Whether the field at `index` is summed into the checksum.
    pub fn is_summed(&self, index: usize) -> bool {
        self.checksum_fields.binary_search(&index).is_ok()
    }

    /// Check the structural rules every layout must satisfy.
    ///
    /// Returns a description of the first violation found.
    pub fn check(&self) -> Result<(), String> {
        let Some(checksum) = self.fields.last() else {
            return Err("layout has no fields".to_string());
        };
        if !checksum.kind.is_integer() {
            return Err(format!("checksum field {} is not an integer", checksum.name));
        }
        for (position, field) in self.fields.iter().enumerate() {
            if field.index != position {
                return Err(format!(
                    "field {} declared at index {} but placed at {position}",
                    field.name, field.index
                ));
            }
            if self.fields[..position].iter().any(|f| f.name == field.name) {
                return Err(format!("duplicate field name {}", field.name));
            }
        }
        if !self.checksum_fields.windows(2).all(|w| w[0] < w[1]) {
            return Err("checksum fields are not strictly ascending".to_string());
        }
        for &index in self.checksum_fields {
            if index >= self.checksum_index() {
                return Err(format!("checksum sums out-of-range or self index {index}"));
            }
            if !self.fields[index].kind.is_integer() {
                return Err(format!(
                    "checksum sums non-integer field {}",
                    self.fields[index].name
                ));
            }
        }
        Ok(())
    }
}
