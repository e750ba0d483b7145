/// Shown wherever a value is absent.
pub const PLACEHOLDER: &str = "\u{2014}";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BannerMode {
    /// Logos and title on the first page only; later pages get the border.
    FirstPage,
    /// Border, logos and title redrawn after every page break.
    EveryPage,
}

/// A complete report description: what to draw, in order.
#[derive(Clone, Debug)]
pub struct Report {
    pub title: String,
    pub subtitle: String,
    pub sections: Vec<Section>,
    pub footer: String,
    pub file_name: String,
    pub banner: BannerMode,
}

#[derive(Clone, Debug)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Section {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn field(mut self, label: impl Into<String>, value: Option<String>) -> Self {
        self.blocks.push(Block::Field(Field::new(label, value)));
        self
    }

    pub fn note(mut self, label: impl Into<String>, value: Option<String>) -> Self {
        self.blocks.push(Block::Note(Field::new(label, value)));
        self
    }

    pub fn photo(mut self, label: impl Into<String>, source: Option<String>) -> Self {
        self.blocks.push(Block::Photo {
            label: label.into(),
            source,
        });
        self
    }

    pub fn table(mut self, table: Table) -> Self {
        self.blocks.push(Block::Table(table));
        self
    }

    pub fn group(mut self, title: impl Into<String>, fields: Vec<Field>) -> Self {
        self.blocks.push(Block::Group {
            title: title.into(),
            fields,
        });
        self
    }
}

#[derive(Clone, Debug)]
pub enum Block {
    /// Label, separator and wrapped value on one row.
    Field(Field),
    /// Bold caption above a rounded box of free text.
    Note(Field),
    /// Framed image. Drawn only when `source` is an embedded-image string.
    Photo {
        label: String,
        source: Option<String>,
    },
    Table(Table),
    /// Bold subheading, its fields, then a thin divider.
    Group { title: String, fields: Vec<Field> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub label: String,
    pub value: Option<String>,
}

impl Field {
    pub fn new(label: impl Into<String>, value: Option<String>) -> Self {
        Field {
            label: label.into(),
            value,
        }
    }
}

/// Display form of an optional value. Whitespace-only counts as absent.
pub fn display_text(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => PLACEHOLDER,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub label: String,
    pub width: f32,
}

impl Column {
    pub fn new(label: impl Into<String>, width: f32) -> Self {
        Column {
            label: label.into(),
            width,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Option<String>>>,
    /// Label and message of the single line drawn instead of an empty table.
    pub empty_label: String,
    pub empty_message: String,
}

impl Table {
    pub fn new(columns: Vec<Column>, empty_message: impl Into<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
            empty_label: "Summary".to_string(),
            empty_message: empty_message.into(),
        }
    }

    pub fn row(&mut self, values: Vec<Option<String>>) {
        self.rows.push(values);
    }

    pub fn widths(&self) -> Vec<f32> {
        self.columns.iter().map(|c| c.width).collect()
    }
}
