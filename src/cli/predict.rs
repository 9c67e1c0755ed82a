use serde_json::Value;

use crate::cli::commands::PredictArgs;
use crate::errors::ForecastError;
use crate::features::PredictInput;
use crate::model::Predictor;

pub async fn handle_predict(args: PredictArgs) -> Result<(), ForecastError> {
    let predictor = Predictor::load(&args.artifact_dir).await?;
    let raw: Value = serde_json::from_slice(&tokio::fs::read(&args.input).await?)?;

    let output = match raw {
        Value::Array(items) => {
            let inputs = items
                .into_iter()
                .map(PredictInput::from_json)
                .collect::<Result<Vec<_>, _>>()?;
            serde_json::to_string_pretty(&predictor.predict_batch(&inputs)?)?
        }
        single => serde_json::to_string_pretty(&predictor.predict(&PredictInput::from_json(single)?)?)?,
    };
    println!("{}", output);
    Ok(())
}
