use super::{Extractor, ParsingContext};
use crate::error::CollectorError;
use crate::model::RecipeRecord;
use html_escape::decode_html_entities;
use log::debug;
use scraper::Selector;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub struct JsonLdExtractor;

impl JsonLdExtractor {
    fn convert_to_record(&self, json_ld_recipe: JsonLdRecipe, url: &str) -> RecipeRecord {
        let title = json_ld_recipe
            .name
            .as_ref()
            .and_then(Value::as_str)
            .map(decode_html_symbols)
            .filter(|name| !name.is_empty());

        let ingredients = match json_ld_recipe.recipe_ingredient {
            Some(RecipeIngredients::Single(line)) => vec![line],
            Some(RecipeIngredients::Multiple(items)) => {
                items.iter().filter_map(ingredient_line).collect()
            }
            Some(RecipeIngredients::Other(value)) => {
                debug!("JsonLdExtractor: Ignoring recipeIngredient of unexpected shape: {}", value);
                Vec::new()
            }
            None => Vec::new(),
        };

        let instructions = match json_ld_recipe.recipe_instructions {
            Some(instructions) => instruction_texts(instructions),
            None => Vec::new(),
        };

        // Only the first image is kept; downloading it is left to the caller
        let image_url = json_ld_recipe
            .image
            .and_then(first_image)
            .map(|url| decode_html_symbols(&url))
            .filter(|url| !url.is_empty());

        RecipeRecord {
            title,
            ingredients: clean_lines(ingredients),
            instructions: clean_lines(instructions),
            nutrition: nutrition_fields(json_ld_recipe.nutrition),
            url: url.to_string(),
            image_url,
            image_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonLdRecipe {
    name: Option<Value>,
    image: Option<ImageType>,
    #[serde(rename = "recipeIngredient")]
    recipe_ingredient: Option<RecipeIngredients>,
    #[serde(rename = "recipeInstructions")]
    recipe_instructions: Option<RecipeInstructions>,
    nutrition: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageType {
    String(String),
    // checked before Object: serde would also build an ImageObject from an array
    Multiple(Vec<ImageType>),
    Object(ImageObject),
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct ImageObject {
    url: Option<String>,
    #[serde(rename = "contentUrl")]
    content_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeIngredients {
    Single(String),
    Multiple(Vec<Value>),
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeInstructions {
    String(String),
    Multiple(Vec<InstructionItem>),
    Step(HowToStep),
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstructionItem {
    Text(String),
    Nested(Vec<InstructionItem>),
    Step(HowToStep),
    Other(Value),
}

/// A `HowToStep`, or a `HowToSection` holding steps in `itemListElement`
#[derive(Debug, Deserialize)]
struct HowToStep {
    text: Option<String>,
    name: Option<String>,
    #[serde(rename = "itemListElement", default)]
    item_list_element: Vec<InstructionItem>,
}

fn instruction_texts(instructions: RecipeInstructions) -> Vec<String> {
    match instructions {
        RecipeInstructions::String(text) => vec![text],
        RecipeInstructions::Multiple(items) => items.into_iter().flat_map(item_texts).collect(),
        RecipeInstructions::Step(step) => item_texts(InstructionItem::Step(step)),
        RecipeInstructions::Other(value) => {
            debug!("JsonLdExtractor: Ignoring recipeInstructions of unexpected shape: {}", value);
            Vec::new()
        }
    }
}

fn item_texts(item: InstructionItem) -> Vec<String> {
    match item {
        InstructionItem::Text(text) => vec![text],
        InstructionItem::Nested(items) => items.into_iter().flat_map(item_texts).collect(),
        InstructionItem::Step(step) => match step.text {
            Some(text) => vec![text],
            None if !step.item_list_element.is_empty() => step
                .item_list_element
                .into_iter()
                .flat_map(item_texts)
                .collect(),
            None => step.name.into_iter().collect(),
        },
        InstructionItem::Other(value) => {
            debug!("JsonLdExtractor: Ignoring instruction item of unexpected shape: {}", value);
            Vec::new()
        }
    }
}

fn ingredient_line(item: &Value) -> Option<String> {
    match item {
        Value::String(line) => Some(line.clone()),
        Value::Object(fields) => {
            let name = fields.get("name").and_then(Value::as_str)?;
            match fields.get("amount").and_then(Value::as_str).map(str::trim) {
                Some(amount) if !amount.is_empty() => Some(format!("{amount} {name}")),
                _ => Some(name.to_string()),
            }
        }
        _ => None,
    }
}

fn first_image(image: ImageType) -> Option<String> {
    match image {
        ImageType::String(url) => Some(url),
        ImageType::Multiple(images) => images.into_iter().next().and_then(first_image),
        ImageType::Object(object) => object.url.or(object.content_url),
        ImageType::Other(value) => {
            debug!("JsonLdExtractor: Ignoring image of unexpected shape: {}", value);
            None
        }
    }
}

/// Keep text nutrition values as given; numbers are rendered without a unit
fn nutrition_fields(nutrition: Option<Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(fields)) = nutrition else {
        return BTreeMap::new();
    };

    fields
        .into_iter()
        .filter(|(key, _)| !key.starts_with('@'))
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key, text)),
            Value::Number(number) => Some((key, number.to_string())),
            _ => None,
        })
        .collect()
}

fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .iter()
        .map(|line| decode_html_symbols(line).trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn decode_html_symbols(text: &str) -> String {
    // some sites double-encode entities (`&amp;amp;`)
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(type_str)) => type_str.eq_ignore_ascii_case("recipe"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|type_str| type_str.eq_ignore_ascii_case("recipe")),
        _ => false,
    }
}

/// Pick the Recipe object out of one parsed JSON-LD block.
///
/// Arrays yield their first Recipe element; a non-Recipe object yields the
/// first entry of its `@graph`. The result must itself be Recipe-typed.
fn resolve_recipe(json_ld: &Value) -> Option<&Value> {
    let candidate = match json_ld {
        Value::Array(items) => items.iter().find(|item| is_recipe_type(item)),
        value if is_recipe_type(value) => Some(value),
        value => value
            .get("@graph")
            .and_then(Value::as_array)
            .and_then(|graph| graph.first()),
    };

    candidate.filter(|value| is_recipe_type(value))
}

impl Extractor for JsonLdExtractor {
    fn parse(&self, context: &ParsingContext) -> Result<RecipeRecord, CollectorError> {
        debug!("JsonLdExtractor: Starting parse for URL: {}", context.url);
        let selector = Selector::parse(r#"script[type="application/ld+json"]"#)
            .expect("static JSON-LD selector is valid");

        for (index, script) in context.document.select(&selector).enumerate() {
            let raw_json = script.text().collect::<String>();

            let json_ld = match serde_json::from_str::<Value>(raw_json.trim()) {
                Ok(json_ld) => json_ld,
                Err(e) => {
                    debug!("JsonLdExtractor: Failed to parse JSON-LD {}: {}", index, e);
                    continue;
                }
            };

            let Some(recipe_json) = resolve_recipe(&json_ld) else {
                debug!("JsonLdExtractor: No recipe found in JSON-LD {}", index);
                continue;
            };

            match serde_json::from_value::<JsonLdRecipe>(recipe_json.clone()) {
                Ok(recipe) => {
                    debug!("JsonLdExtractor: Found recipe in JSON-LD {}", index);
                    return Ok(self.convert_to_record(recipe, &context.url));
                }
                Err(e) => {
                    debug!("JsonLdExtractor: Failed to read recipe fields in JSON-LD {}: {}", index, e);
                }
            }
        }

        Err(CollectorError::NotFound(context.url.clone()))
    }
}
