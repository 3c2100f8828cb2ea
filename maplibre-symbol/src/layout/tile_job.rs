//! The asynchronous per-tile task around the layout pass.

use async_trait::async_trait;

use crate::{
    buckets::symbol_bucket::SymbolBucket,
    error::{ResourceFetchError, SendError, SymbolLayoutError},
    layout::symbol_layout::{
        perform_symbol_layout, SymbolFeature, SymbolLayoutParameters, SymbolResources,
    },
    style::symbol_layer::SymbolLayer,
    text::{
        glyph::{GlyphDependencies, GlyphMap, GlyphPositions},
        i18n,
        image::{ImageDependencies, ImageMap, ImagePositions},
    },
};

/// Resolves glyphs and images, usually from a cache in front of the network.
///
/// On the web platform futures are not thread-safe. Whether the futures of the provider have to be
/// `Send` is decided by the feature "thread-safe-futures".
#[cfg_attr(not(feature = "thread-safe-futures"), async_trait(?Send))]
#[cfg_attr(feature = "thread-safe-futures", async_trait)]
pub trait SymbolResourceProvider: Send + Sync {
    async fn get_glyphs(
        &self,
        dependencies: &GlyphDependencies,
    ) -> Result<(GlyphMap, GlyphPositions), ResourceFetchError>;

    async fn get_images(
        &self,
        dependencies: &ImageDependencies,
    ) -> Result<(ImageMap, ImagePositions), ResourceFetchError>;
}

/// Receives the result of a tile job.
pub trait SymbolLayoutContext {
    /// Whether the tile was invalidated or reloaded since the job started.
    fn is_cancelled(&self) -> bool;

    fn commit(&mut self, bucket: SymbolBucket) -> Result<(), SendError>;
}

/// The features of one symbol layer on one tile.
#[derive(Debug, Clone)]
pub struct SymbolTileRequest {
    pub layer: SymbolLayer,
    pub features: Vec<SymbolFeature>,
    pub parameters: SymbolLayoutParameters,
}

/// Glyphs and images the features of a tile refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolDependencies {
    pub glyphs: GlyphDependencies,
    pub images: ImageDependencies,
}

impl SymbolDependencies {
    pub fn collect(layer: &SymbolLayer, features: &[SymbolFeature], zoom: f64) -> Self {
        let layout = &layer.layout;
        let can_verticalize_text = layout.text_along_line() && layout.text_keep_upright;
        let mut dependencies = SymbolDependencies::default();

        for feature in features {
            if let Some(text) = &feature.text {
                let font_stack = layout
                    .text_font
                    .evaluate(zoom, &feature.properties)
                    .unwrap_or_default();
                let glyphs = dependencies.glyphs.entry(font_stack).or_default();
                glyphs.extend(text.chars());

                if can_verticalize_text && i18n::allows_vertical_writing_mode(text) {
                    glyphs.extend(i18n::verticalize_punctuation_str(text).chars());
                }
            }

            if let Some(icon) = &feature.icon {
                dependencies.images.insert(icon.clone());
            }
        }

        dependencies
    }
}

/// Lays out one symbol layer of a tile. Waits for the glyphs and then for the images the features
/// need, runs the layout pass and commits the bucket to `context`.
///
/// Nothing is committed if the job fails or the tile is cancelled.
#[tracing::instrument(skip_all)]
pub async fn layout_symbol_tile<P, C>(
    request: SymbolTileRequest,
    provider: &P,
    context: &mut C,
) -> Result<(), SymbolLayoutError>
where
    P: SymbolResourceProvider + ?Sized,
    C: SymbolLayoutContext,
{
    let SymbolTileRequest {
        layer,
        mut features,
        parameters,
    } = request;

    for feature in &mut features {
        feature.resolve_label(&layer.layout, parameters.zoom);
    }

    let dependencies = SymbolDependencies::collect(&layer, &features, parameters.zoom);
    tracing::debug!(
        "layer {} needs {} font stacks and {} images",
        layer.id,
        dependencies.glyphs.len(),
        dependencies.images.len()
    );

    let (glyph_map, glyph_positions) = provider.get_glyphs(&dependencies.glyphs).await?;
    if context.is_cancelled() {
        tracing::info!("symbol layout of layer {} cancelled", layer.id);
        return Err(SymbolLayoutError::Cancelled);
    }

    let (image_map, image_positions) = provider.get_images(&dependencies.images).await?;
    if context.is_cancelled() {
        tracing::info!("symbol layout of layer {} cancelled", layer.id);
        return Err(SymbolLayoutError::Cancelled);
    }

    let resources = SymbolResources {
        glyph_map,
        glyph_positions,
        image_map,
        image_positions,
    };
    let bucket = perform_symbol_layout(&layer, &features, &resources, &parameters);

    if context.is_cancelled() {
        tracing::info!("symbol layout of layer {} cancelled", layer.id);
        return Err(SymbolLayoutError::Cancelled);
    }

    tracing::info!(
        "symbol layout of layer {} finished with {} instances",
        layer.id,
        bucket.symbol_instances.len()
    );
    context.commit(bucket)?;

    Ok(())
}
