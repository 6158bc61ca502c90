//! Layer-by-layer description of a sequential image classifier.
//!
//! Building a model validates shapes and counts parameters; no weights are
//! allocated.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArchitectureError {
    #[error("Layer {index} ({layer}) expects a spatial input, got a flat vector of {size}")]
    ExpectedSpatial {
        index: usize,
        layer: &'static str,
        size: u64,
    },

    #[error("Layer {index} ({layer}) expects a flat input; add a flatten layer first")]
    ExpectedFlat { index: usize, layer: &'static str },

    #[error("Layer {index} ({layer}) window {window:?} does not fit input {height}x{width}")]
    WindowTooLarge {
        index: usize,
        layer: &'static str,
        window: (u32, u32),
        height: u32,
        width: u32,
    },

    #[error("Layer {index} ({layer}) must have a non-zero size")]
    ZeroSized { index: usize, layer: &'static str },

    #[error("Model has no layers")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Linear,
    Relu,
    Softmax,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    /// Valid-padded, stride-1 convolution.
    Conv2d {
        filters: u32,
        kernel: (u32, u32),
        activation: Activation,
    },
    /// Non-overlapping max pooling (stride equals pool size).
    MaxPool2d { pool: (u32, u32) },
    Flatten,
    Dense { units: u32, activation: Activation },
}

impl Layer {
    pub fn kind(&self) -> &'static str {
        match self {
            Layer::Conv2d { .. } => "conv2d",
            Layer::MaxPool2d { .. } => "max_pooling2d",
            Layer::Flatten => "flatten",
            Layer::Dense { .. } => "dense",
        }
    }
}

/// Activation tensor shape, batch dimension excluded. Channels last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Shape {
    Spatial { height: u32, width: u32, channels: u32 },
    Flat(u64),
}

impl Shape {
    pub fn size(&self) -> u64 {
        match *self {
            Shape::Spatial {
                height,
                width,
                channels,
            } => height as u64 * width as u64 * channels as u64,
            Shape::Flat(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    #[serde(flatten)]
    pub layer: Layer,
    pub output_shape: Shape,
    pub params: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileOptions {
    pub optimizer: String,
    pub loss: String,
    pub metrics: Vec<String>,
}

/// A validated model: per-layer shapes and parameter counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledModel {
    pub name: String,
    pub input_shape: Shape,
    pub layers: Vec<LayerSummary>,
    pub total_params: u64,
    pub compile: CompileOptions,
}

impl CompiledModel {
    pub fn output_shape(&self) -> Shape {
        self.layers
            .last()
            .map(|l| l.output_shape)
            .unwrap_or(self.input_shape)
    }
}

#[derive(Debug, Clone)]
pub struct Sequential {
    name: String,
    input: Shape,
    layers: Vec<Layer>,
}

impl Sequential {
    pub fn new(name: &str, input: (u32, u32, u32)) -> Self {
        Self {
            name: name.to_string(),
            input: Shape::Spatial {
                height: input.0,
                width: input.1,
                channels: input.2,
            },
            layers: Vec::new(),
        }
    }

    pub fn add(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn compile(self, options: CompileOptions) -> Result<CompiledModel, ArchitectureError> {
        if self.layers.is_empty() {
            return Err(ArchitectureError::Empty);
        }

        let mut shape = self.input;
        let mut summaries = Vec::with_capacity(self.layers.len());

        for (index, layer) in self.layers.into_iter().enumerate() {
            let (output_shape, params) = infer(index, &layer, shape)?;
            summaries.push(LayerSummary {
                layer,
                output_shape,
                params,
            });
            shape = output_shape;
        }

        let total_params = summaries.iter().map(|s| s.params).sum();

        Ok(CompiledModel {
            name: self.name,
            input_shape: self.input,
            layers: summaries,
            total_params,
            compile: options,
        })
    }
}

fn infer(index: usize, layer: &Layer, input: Shape) -> Result<(Shape, u64), ArchitectureError> {
    let kind = layer.kind();
    match *layer {
        Layer::Conv2d {
            filters, kernel, ..
        } => {
            let (height, width, channels) = spatial(index, kind, input)?;
            if filters == 0 || kernel.0 == 0 || kernel.1 == 0 {
                return Err(ArchitectureError::ZeroSized { index, layer: kind });
            }
            if kernel.0 > height || kernel.1 > width {
                return Err(ArchitectureError::WindowTooLarge {
                    index,
                    layer: kind,
                    window: kernel,
                    height,
                    width,
                });
            }
            let output = Shape::Spatial {
                height: height - kernel.0 + 1,
                width: width - kernel.1 + 1,
                channels: filters,
            };
            let params =
                (kernel.0 as u64 * kernel.1 as u64 * channels as u64 + 1) * filters as u64;
            Ok((output, params))
        }
        Layer::MaxPool2d { pool } => {
            let (height, width, channels) = spatial(index, kind, input)?;
            if pool.0 == 0 || pool.1 == 0 {
                return Err(ArchitectureError::ZeroSized { index, layer: kind });
            }
            if pool.0 > height || pool.1 > width {
                return Err(ArchitectureError::WindowTooLarge {
                    index,
                    layer: kind,
                    window: pool,
                    height,
                    width,
                });
            }
            let output = Shape::Spatial {
                height: height / pool.0,
                width: width / pool.1,
                channels,
            };
            Ok((output, 0))
        }
        Layer::Flatten => Ok((Shape::Flat(input.size()), 0)),
        Layer::Dense { units, .. } => {
            let Shape::Flat(inputs) = input else {
                return Err(ArchitectureError::ExpectedFlat { index, layer: kind });
            };
            if units == 0 {
                return Err(ArchitectureError::ZeroSized { index, layer: kind });
            }
            Ok((Shape::Flat(units as u64), (inputs + 1) * units as u64))
        }
    }
}

fn spatial(
    index: usize,
    layer: &'static str,
    shape: Shape,
) -> Result<(u32, u32, u32), ArchitectureError> {
    match shape {
        Shape::Spatial {
            height,
            width,
            channels,
        } => Ok((height, width, channels)),
        Shape::Flat(size) => Err(ArchitectureError::ExpectedSpatial { index, layer, size }),
    }
}

/// Number of freshness classes the classifier predicts.
pub const NUM_CLASSES: u32 = 4;

/// Small CNN used as the freshness classifier baseline.
pub fn freshness_cnn() -> Result<CompiledModel, ArchitectureError> {
    Sequential::new("freshness_cnn", (128, 128, 3))
        .add(Layer::Conv2d {
            filters: 32,
            kernel: (3, 3),
            activation: Activation::Relu,
        })
        .add(Layer::MaxPool2d { pool: (2, 2) })
        .add(Layer::Flatten)
        .add(Layer::Dense {
            units: 64,
            activation: Activation::Relu,
        })
        .add(Layer::Dense {
            units: NUM_CLASSES,
            activation: Activation::Softmax,
        })
        .compile(CompileOptions {
            optimizer: "adam".to_string(),
            loss: "categorical_crossentropy".to_string(),
            metrics: vec!["accuracy".to_string()],
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> CompileOptions {
        CompileOptions {
            optimizer: "adam".to_string(),
            loss: "categorical_crossentropy".to_string(),
            metrics: vec![],
        }
    }

    #[test]
    fn freshness_cnn_shapes_and_params() {
        let model = freshness_cnn().unwrap();

        let shapes: Vec<_> = model.layers.iter().map(|l| l.output_shape).collect();
        assert_eq!(
            shapes,
            vec![
                Shape::Spatial {
                    height: 126,
                    width: 126,
                    channels: 32
                },
                Shape::Spatial {
                    height: 63,
                    width: 63,
                    channels: 32
                },
                Shape::Flat(127_008),
                Shape::Flat(64),
                Shape::Flat(4),
            ]
        );

        let params: Vec<_> = model.layers.iter().map(|l| l.params).collect();
        assert_eq!(params, vec![896, 0, 0, 8_128_576, 260]);
        assert_eq!(model.total_params, 8_129_732);
        assert_eq!(model.output_shape(), Shape::Flat(NUM_CLASSES as u64));
    }

    #[test]
    fn pooling_floors_odd_dimensions() {
        let model = Sequential::new("pool", (7, 5, 2))
            .add(Layer::MaxPool2d { pool: (2, 2) })
            .compile(options())
            .unwrap();
        assert_eq!(
            model.output_shape(),
            Shape::Spatial {
                height: 3,
                width: 2,
                channels: 2
            }
        );
    }

    #[test]
    fn dense_before_flatten_is_rejected() {
        let err = Sequential::new("bad", (8, 8, 3))
            .add(Layer::Dense {
                units: 4,
                activation: Activation::Softmax,
            })
            .compile(options())
            .unwrap_err();
        assert_eq!(
            err,
            ArchitectureError::ExpectedFlat {
                index: 0,
                layer: "dense"
            }
        );
    }

    #[test]
    fn conv_after_flatten_is_rejected() {
        let err = Sequential::new("bad", (8, 8, 3))
            .add(Layer::Flatten)
            .add(Layer::Conv2d {
                filters: 8,
                kernel: (3, 3),
                activation: Activation::Relu,
            })
            .compile(options())
            .unwrap_err();
        assert_eq!(
            err,
            ArchitectureError::ExpectedSpatial {
                index: 1,
                layer: "conv2d",
                size: 192
            }
        );
    }

    #[test]
    fn kernel_larger_than_input_is_rejected() {
        let err = Sequential::new("bad", (2, 2, 1))
            .add(Layer::Conv2d {
                filters: 1,
                kernel: (3, 3),
                activation: Activation::Linear,
            })
            .compile(options())
            .unwrap_err();
        assert!(matches!(err, ArchitectureError::WindowTooLarge { index: 0, .. }));
    }

    #[test]
    fn empty_model_is_rejected() {
        let err = Sequential::new("empty", (8, 8, 3)).compile(options()).unwrap_err();
        assert_eq!(err, ArchitectureError::Empty);
    }

    #[test]
    fn serializes_layer_config_and_shapes() {
        let model = freshness_cnn().unwrap();
        let json = serde_json::to_value(&model).unwrap();

        assert_eq!(json["name"], "freshness_cnn");
        assert_eq!(json["input_shape"]["height"], 128);
        assert_eq!(json["layers"][0]["type"], "conv2d");
        assert_eq!(json["layers"][0]["filters"], 32);
        assert_eq!(json["layers"][0]["activation"], "relu");
        assert_eq!(json["layers"][2]["output_shape"], 127_008);
        assert_eq!(json["layers"][4]["activation"], "softmax");
        assert_eq!(json["compile"]["optimizer"], "adam");
        assert_eq!(json["total_params"], 8_129_732);
    }
}
