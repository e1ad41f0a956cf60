use crate::models::feature::{GeocodeFeature, class_name};
use comfy_table::{Attribute, Cell, CellAlignment, Table};
use std::collections::BTreeMap;

pub fn print_dataset_summary(features: &[GeocodeFeature]) {
    // class -> (features, points, polygons, synonym entries)
    let mut class_info: BTreeMap<i32, (usize, usize, usize, usize)> = BTreeMap::new();
    for feature in features {
        let entry = class_info
            .entry(feature.properties.class)
            .or_insert((0, 0, 0, 0));
        entry.0 += 1;
        entry.1 += feature.point.is_some() as usize;
        entry.2 += feature.polygon.is_some() as usize;
        entry.3 += feature.properties.synonyms.as_ref().map_or(0, Vec::len);
    }

    let mut table = Table::new();
    table
        .set_header(vec![
            Cell::new("")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center),
            Cell::new("Class")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center),
            Cell::new("Features")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center),
            Cell::new("Points")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center),
            Cell::new("Polygons")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center),
            Cell::new("Synonyms")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center),
        ])
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED);

    let mut warnings = Vec::new();
    for (class, (count, points, polygons, synonyms)) in class_info {
        let label = class_name(class)
            .map(str::to_string)
            .unwrap_or_else(|| format!("class {class}"));
        let mut row = vec![
            Cell::new("✅").set_alignment(CellAlignment::Center), // Default success overwritten to warning if needed
            Cell::new(&label),
            Cell::new(count).set_alignment(CellAlignment::Center),
            Cell::new(points).set_alignment(CellAlignment::Center),
            Cell::new(polygons).set_alignment(CellAlignment::Center),
            Cell::new(synonyms).set_alignment(CellAlignment::Center),
        ];

        if points < count {
            warnings.push(format!(
                "  ⚠️{}: {} of {} features have no point geometry",
                label,
                count - points,
                count
            ));
            row[0] = Cell::new("⚠️");
        }

        table.add_row(row);
    }

    println!("\nDataset summary:\n{}", table);

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in warnings {
            println!("{}", warning);
        }
    }

    println!();
}
