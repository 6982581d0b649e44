use btcm7_core::{AlignConfig, Btcm7Error, RawSeries, SeriesRequest, align};
use chrono::{NaiveDate, Utc};

use crate::Btcm7;
use crate::router::util::{collapse_errors, join_with_deadline};
use crate::snapshot::Snapshot;

const CAPABILITY: &str = "refresh";

impl Btcm7 {
    /// Refresh over the configured period ending today (UTC), starting at
    /// [`Btcm7::fetch_start`].
    ///
    /// # Errors
    /// See [`Btcm7::refresh_range`].
    pub async fn refresh(&self) -> Result<Snapshot, Btcm7Error> {
        let end = Utc::now().date_naive();
        let start = self.fetch_start(end);
        self.refresh_range(start, end).await
    }

    /// Fetch every ticker over `[start, end]`, align the series and compute
    /// the indicators.
    ///
    /// All tickers must succeed: a failed ticker fails the whole refresh.
    ///
    /// # Errors
    /// - `InvalidArg` if `start > end`.
    /// - `Ticker { symbol, .. }` for a single failed ticker, or `RefreshFailed`
    ///   listing every failed ticker.
    /// - `RequestTimeout` if the configured `request_timeout` elapses.
    /// - `InsufficientHistory` if too few aligned rows remain for the
    ///   configured windows.
    /// - `InvalidConfig` from the indicator engine.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "btcm7::refresh",
            skip(self),
            fields(tickers = self.tickers.len(), start = %start, end = %end),
        )
    )]
    pub async fn refresh_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Snapshot, Btcm7Error> {
        let req = SeriesRequest::try_new(start, end, self.cfg.interval)?;
        let series = self.fetch_all(&req).await?;
        let out = self.assemble(&req, series);
        #[cfg(feature = "tracing")]
        match &out {
            Ok(s) => tracing::info!(rows = s.len(), signal = %s.signal(), "refresh complete"),
            Err(e) => tracing::warn!(error = %e, "refresh failed"),
        }
        out
    }

    async fn fetch_all(&self, req: &SeriesRequest) -> Result<Vec<RawSeries>, Btcm7Error> {
        let tasks = self.tickers.iter().map(|t| {
            let client = &self.client;
            let timeout = self.cfg.provider_timeout;
            async move {
                client
                    .fetch_with_timeout(t, req, timeout)
                    .await
                    .map_err(|e| Btcm7Error::for_ticker(t.symbol(), e))
            }
        });
        let joined = join_with_deadline(
            tasks,
            self.cfg.max_concurrency,
            self.cfg.request_timeout,
            CAPABILITY,
        )
        .await?;

        let mut series = Vec::with_capacity(joined.len());
        let mut errors = Vec::new();
        for res in joined {
            match res {
                Ok(s) => series.push(s),
                Err(e) => errors.push(e),
            }
        }
        if !errors.is_empty() {
            return Err(collapse_errors(errors));
        }
        Ok(series)
    }

    fn assemble(&self, req: &SeriesRequest, series: Vec<RawSeries>) -> Result<Snapshot, Btcm7Error> {
        if let Some(empty) = series.iter().find(|s| s.is_empty()) {
            return Err(Btcm7Error::for_ticker(
                empty.ticker().symbol(),
                Btcm7Error::Data(format!(
                    "no observations between {} and {}",
                    req.start(),
                    req.end()
                )),
            ));
        }
        let data_as_of = series
            .iter()
            .map(RawSeries::fetched_at)
            .min()
            .unwrap_or_else(Utc::now);
        let align_cfg = AlignConfig {
            min_rows: self.required_rows(),
            ..self.cfg.align.clone()
        };
        let table = align(series, &align_cfg)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            rows = table.len(),
            filled = table.filled_cells(),
            "aligned series"
        );
        let indicators = self.engine.compute(&table)?;
        Ok(Snapshot {
            tickers: self.tickers.clone(),
            start: req.start(),
            end: req.end(),
            interval: req.interval(),
            table,
            indicators,
            data_as_of,
            created_at: Utc::now(),
        })
    }
}
