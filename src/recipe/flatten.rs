use crate::recipe::{FlattenError, RecipeRecord};
use serde_json::{Map, Value};

/// Key the engagement metadata is merged under
const ENGAGEMENT_KEY: &str = "yums";

/// How the cards of a related-recipe collection are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionShape {
    /// A plain list of cards
    Cards,
    /// A list of carousels, each holding its cards under `cards.newList`
    Carousels,
}

/// A related-recipe collection embedded in a page's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedCollection {
    pub key: &'static str,
    pub shape: CollectionShape,
}

/// The related-recipe collections, in the order they are drained
pub const RELATED_COLLECTIONS: [RelatedCollection; 3] = [
    RelatedCollection {
        key: "moreFromSource",
        shape: CollectionShape::Cards,
    },
    RelatedCollection {
        key: "relatedRecipes",
        shape: CollectionShape::Cards,
    },
    RelatedCollection {
        key: "spotlightCarousels",
        shape: CollectionShape::Carousels,
    },
];

impl RelatedCollection {
    /// The collection key plus its UI-only `Loaded`/`Loading` companions
    fn stripped_keys(&self) -> [String; 3] {
        [
            self.key.to_string(),
            format!("{}Loaded", self.key),
            format!("{}Loading", self.key),
        ]
    }

    /// Lists every card of the collection with its location in the tree
    fn cards<'a>(
        &self,
        value: &'a Value,
        path: &str,
    ) -> Result<Vec<(&'a Map<String, Value>, String)>, FlattenError> {
        let items = expect_array(value, path)?;

        match self.shape {
            CollectionShape::Cards => items
                .iter()
                .enumerate()
                .map(|(i, entry)| expect_card(entry, format!("{}[{}]", path, i)))
                .collect(),

            CollectionShape::Carousels => {
                let mut cards = Vec::new();
                for (i, carousel) in items.iter().enumerate() {
                    let carousel_path = format!("{}[{}]", path, i);
                    let list = carousel
                        .get("cards")
                        .and_then(|cards| cards.get("newList"))
                        .ok_or_else(|| FlattenError::MalformedCollection {
                            path: carousel_path.clone(),
                            detail: "carousel has no cards.newList".to_string(),
                        })?;

                    let list_path = format!("{}.cards.newList", carousel_path);
                    for (j, entry) in expect_array(list, &list_path)?.iter().enumerate() {
                        cards.push(expect_card(entry, format!("{}[{}]", list_path, j))?);
                    }
                }
                Ok(cards)
            }
        }
    }
}

/// Flattens a decoded state tree into independent recipe records
///
/// The walk is depth-first: every related recipe nested in a fragment is
/// emitted before the fragment's own record, so for a whole page the page's
/// own recipe (if any) is always the last element. Records carry no trace of
/// the related-recipe collections they were found in.
///
/// A fragment without a `recipe` node contributes nothing. Identical
/// fragments reachable twice are emitted twice; deduplication across records
/// is left to the caller.
///
/// # Example
///
/// ```
/// use serde_json::json;
///
/// let tree = json!({
///     "recipe": {"id": "A", "share": {"url": "u/a"}},
///     "moreFromSource": [
///         {"id": "B", "recipeInfo": {"recipe": {"id": "B", "share": {"url": "u/b"}}}}
///     ]
/// });
///
/// let records = larder::flatten(&tree).unwrap();
/// let ids: Vec<_> = records.iter().map(|r| r.id()).collect();
/// assert_eq!(ids, ["B", "A"]);
/// ```
pub fn flatten(tree: &Value) -> Result<Vec<RecipeRecord>, FlattenError> {
    let mut records = Vec::new();
    flatten_fragment(tree, "$", &mut records)?;
    Ok(records)
}

fn flatten_fragment(
    fragment: &Value,
    path: &str,
    out: &mut Vec<RecipeRecord>,
) -> Result<(), FlattenError> {
    let fragment = match fragment {
        Value::Object(map) => map,
        Value::Null => return Ok(()),
        _ => {
            return Err(FlattenError::NotAnObject {
                path: path.to_string(),
            })
        }
    };

    let recipe_path = format!("{}.recipe", path);
    let recipe = match fragment.get("recipe") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Object(recipe)) => recipe,
        Some(_) => return Err(FlattenError::NotAnObject { path: recipe_path }),
    };

    let mut stripped: Vec<String> = Vec::new();
    for collection in RELATED_COLLECTIONS {
        // Pages nest the collections in the recipe node; fragments may also
        // carry them next to it.
        for (holder, holder_path) in [(recipe, recipe_path.as_str()), (fragment, path)] {
            let Some(value) = holder.get(collection.key) else {
                continue;
            };

            let collection_path = format!("{}.{}", holder_path, collection.key);
            for (card, card_path) in collection.cards(value, &collection_path)? {
                if let Some(info) = card.get("recipeInfo") {
                    flatten_fragment(info, &format!("{}.recipeInfo", card_path), out)?;
                }
            }
        }

        if recipe.contains_key(collection.key) {
            stripped.extend(collection.stripped_keys());
        }
    }

    let mut node: Map<String, Value> = recipe
        .iter()
        .filter(|(key, _)| !stripped.contains(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    node.insert(ENGAGEMENT_KEY.to_string(), engagement(fragment));

    out.push(RecipeRecord::from_content(node, &recipe_path)?);
    Ok(())
}

/// Picks the engagement metadata of a fragment
///
/// `yums` wins when it carries anything; otherwise `yumsObject` is used as-is.
fn engagement(fragment: &Map<String, Value>) -> Value {
    match fragment.get("yums") {
        Some(yums) if is_truthy(yums) => yums.clone(),
        _ => fragment.get("yumsObject").cloned().unwrap_or(Value::Null),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, FlattenError> {
    value
        .as_array()
        .ok_or_else(|| FlattenError::MalformedCollection {
            path: path.to_string(),
            detail: format!("expected an array, found {}", kind(value)),
        })
}

fn expect_card(
    entry: &Value,
    path: String,
) -> Result<(&Map<String, Value>, String), FlattenError> {
    match entry.as_object() {
        Some(card) => Ok((card, path)),
        None => Err(FlattenError::MalformedCollection {
            detail: format!("expected a card object, found {}", kind(entry)),
            path,
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
