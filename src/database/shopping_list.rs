use std::collections::HashMap;

use serde::Serialize;

use super::schema::CartIngredient;

/*
Rendered list:

flour (g) — 300
egg (unit) — 2
*/

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

impl ShoppingListLine {
    pub fn render(&self) -> String {
        format!(
            "{} ({}) — {}",
            self.name, self.measurement_unit, self.total_amount
        )
    }
}

/// Cart contents merged per (ingredient name, measurement unit), in the order
/// each pair was first seen.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ShoppingList {
    pub lines: Vec<ShoppingListLine>,
}

impl ShoppingList {
    /// Two ingredient rows with the same name and unit merge into one line even
    /// when they are distinct ingredients.
    pub fn aggregate<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = CartIngredient>,
    {
        let mut lines: Vec<ShoppingListLine> = vec![];
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for row in rows {
            let key = (row.name, row.measurement_unit);
            match index.get(&key) {
                Some(&i) => lines[i].total_amount += i64::from(row.amount),
                None => {
                    index.insert(key.clone(), lines.len());
                    lines.push(ShoppingListLine {
                        name: key.0,
                        measurement_unit: key.1,
                        total_amount: i64::from(row.amount),
                    });
                }
            }
        }

        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.lines.iter().map(ShoppingListLine::render)
    }

    pub fn render(&self) -> String {
        self.lines().fold(String::new(), |mut s, line| {
            s += &line;
            s.push('\n');
            s
        })
    }
}
