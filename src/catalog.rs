use log::{debug, warn};

use crate::engine::RetCode;
use crate::error::{AbstractError, Result};
use crate::library::TaLibrary;

impl TaLibrary {
    /// Group names in native enumeration order.
    pub fn function_groups(&self) -> Result<Vec<String>> {
        self.engine()?.group_table().map_err(|status| {
            warn!("group table query failed: {status}");
            AbstractError::Catalog { status }
        })
    }

    /// Function names of `group`. A group the engine does not know yields an
    /// empty list, like an existing group without functions.
    pub fn functions_in_group(&self, group: &str) -> Result<Vec<String>> {
        match self.engine()?.function_table(group) {
            Ok(names) => Ok(names),
            Err(RetCode::GROUP_NOT_FOUND) => {
                debug!("unknown group '{group}', returning no functions");
                Ok(Vec::new())
            }
            Err(status) => {
                warn!("function table query for '{group}' failed: {status}");
                Err(AbstractError::Catalog { status })
            }
        }
    }

    /// Every group with its functions, in native order.
    pub fn function_table(&self) -> Result<Vec<(String, Vec<String>)>> {
        self.function_groups()?
            .into_iter()
            .map(|group| {
                let names = self.functions_in_group(&group)?;
                Ok((group, names))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reference::{ReferenceEngine, GROUPS};

    fn lib() -> TaLibrary {
        TaLibrary::with_engine(ReferenceEngine::new()).unwrap()
    }

    #[test]
    fn test_groups_in_native_order() {
        let groups = lib().function_groups().unwrap();
        assert_eq!(groups, GROUPS.iter().map(|g| g.to_string()).collect::<Vec<_>>());
        assert_eq!(groups[0], "Math Operators");
        assert_eq!(groups[9], "Price Transform");
    }

    #[test]
    fn test_empty_and_unknown_groups() {
        let lib = lib();
        assert!(lib.functions_in_group("Pattern Recognition").unwrap().is_empty());
        assert!(lib.functions_in_group("No Such Group").unwrap().is_empty());
        assert!(lib.functions_in_group("Math Operators").unwrap().contains(&"ADD".to_string()));
    }

    #[test]
    fn test_function_table_covers_every_group() {
        let lib = lib();
        let table = lib.function_table().unwrap();
        assert_eq!(table.len(), GROUPS.len());
        let total: usize = table.iter().map(|(_, names)| names.len()).sum();
        assert_eq!(total, 25);
    }

    #[test]
    fn test_catalog_after_finalize() {
        let lib = lib();
        lib.finalize().unwrap();
        assert!(matches!(lib.function_groups(), Err(AbstractError::Initialization(_))));
        assert!(matches!(
            lib.functions_in_group("Math Operators"),
            Err(AbstractError::Initialization(_))
        ));
    }
}
