#![allow(dead_code)]

use parquet::basic::Type as ParquetType;
use parquet::basic::{Compression, ConvertedType, Repetition, ZstdLevel};
use parquet::data_type::{ByteArray, ByteArrayType, FloatType};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::SerializedFileWriter;
use parquet::record::RowAccessor;
use parquet::schema::types::Type;
use std::fs::File;
use std::sync::Arc;

/// A dense matrix read back from a parquet file
pub struct ParquetMat {
    pub row_major_data: Vec<f32>,
    pub row_names: Vec<Box<str>>,
    pub column_names: Vec<Box<str>>,
}

/// Write a matrix to a parquet file: column `row` keeps the row
/// names and each data column becomes a `FLOAT` field.
///
/// * `data_columns` - column-major values, one vector per column
/// * `row_names` - one name per row
/// * `column_names` - one name per data column
pub fn write_parquet_mat(
    file_path: &str,
    data_columns: &[Vec<f32>],
    row_names: &[Box<str>],
    column_names: &[Box<str>],
) -> anyhow::Result<()> {
    if data_columns.len() != column_names.len() {
        return Err(anyhow::anyhow!(
            "{} data columns vs. {} column names",
            data_columns.len(),
            column_names.len()
        ));
    }

    let mut fields = vec![Arc::new(
        Type::primitive_type_builder("row", ParquetType::BYTE_ARRAY)
            .with_repetition(Repetition::REQUIRED)
            .with_converted_type(ConvertedType::UTF8)
            .build()?,
    )];

    for column_name in column_names {
        fields.push(Arc::new(
            Type::primitive_type_builder(column_name, ParquetType::FLOAT)
                .with_repetition(Repetition::REQUIRED)
                .build()?,
        ));
    }

    let schema = Arc::new(
        Type::group_type_builder("2dMatrix")
            .with_fields(fields)
            .build()?,
    );

    let zstd_level = ZstdLevel::try_new(5)?;
    let writer_properties = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::ZSTD(zstd_level))
            .build(),
    );

    let file = File::create(file_path)?;
    let mut writer = SerializedFileWriter::new(file, schema, writer_properties)?;
    let mut row_group = writer.next_row_group()?;

    {
        let mut col = row_group
            .next_column()?
            .ok_or(anyhow::anyhow!("missing row name column writer"))?;
        let bytes: Vec<ByteArray> = row_names
            .iter()
            .map(|r| ByteArray::from(r.as_ref()))
            .collect();
        col.typed::<ByteArrayType>().write_batch(&bytes, None, None)?;
        col.close()?;
    }

    for values in data_columns {
        if values.len() != row_names.len() {
            return Err(anyhow::anyhow!(
                "data column with {} values vs. {} row names",
                values.len(),
                row_names.len()
            ));
        }
        let mut col = row_group
            .next_column()?
            .ok_or(anyhow::anyhow!("missing data column writer"))?;
        col.typed::<FloatType>().write_batch(values, None, None)?;
        col.close()?;
    }

    row_group.close()?;
    writer.close()?;
    Ok(())
}

/// Read back a matrix written by `write_parquet_mat`; the column `0`
/// keeps the row names and the other numeric columns are coerced to
/// `f32`.
pub fn read_parquet_mat(file_path: &str) -> anyhow::Result<ParquetMat> {
    let file = File::open(file_path)?;
    let reader = SerializedFileReader::new(file)?;
    let metadata = reader.metadata().file_metadata();
    let fields = metadata.schema().get_fields();

    if fields.len() < 2 {
        return Err(anyhow::anyhow!("no data columns in {}", file_path));
    }

    let column_types: Vec<ParquetType> = fields[1..]
        .iter()
        .map(|f| f.get_physical_type())
        .collect();

    let column_names: Vec<Box<str>> = fields[1..]
        .iter()
        .map(|f| f.name().to_string().into_boxed_str())
        .collect();

    let nrows = metadata.num_rows() as usize;
    let ncols = column_names.len();

    let mut row_names: Vec<Box<str>> = Vec::with_capacity(nrows);
    let mut row_major_data: Vec<f32> = Vec::with_capacity(nrows * ncols);

    for record in reader.get_row_iter(None)? {
        let row = record?;
        row_names.push(row.get_string(0)?.clone().into_boxed_str());

        for (j, tt) in column_types.iter().enumerate() {
            let x = match tt {
                ParquetType::FLOAT => row.get_float(j + 1)?,
                ParquetType::DOUBLE => row.get_double(j + 1)? as f32,
                ParquetType::INT32 => row.get_int(j + 1)? as f32,
                ParquetType::INT64 => row.get_long(j + 1)? as f32,
                _ => {
                    return Err(anyhow::anyhow!(
                        "unsupported parquet column type in {}",
                        file_path
                    ))
                }
            };
            row_major_data.push(x);
        }
    }

    Ok(ParquetMat {
        row_major_data,
        row_names,
        column_names,
    })
}
