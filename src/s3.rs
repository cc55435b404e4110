//! Anonymous access to the public Landsat bucket
use aws_sdk_s3::config::Region;
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::Client;

pub async fn anon_client(region: &str) -> Client {
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .no_credentials()
        .region(Region::new(region.to_owned()))
        .load()
        .await;
    Client::new(&config)
}

pub trait S3ObjOps {
    async fn get_object(self: &Self, bucket: &str, key: &str) -> anyhow::Result<GetObjectOutput>;
}

pub struct PublicBucket {
    client: Client,
}

impl PublicBucket {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn anonymous(region: &str) -> Self {
        Self::new(anon_client(region).await)
    }
}

impl S3ObjOps for PublicBucket {
    async fn get_object(self: &Self, bucket: &str, key: &str) -> anyhow::Result<GetObjectOutput> {
        let object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;
        Ok(object)
    }
}
